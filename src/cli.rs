//! CLI argument parsing.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lantern", version, about = "Request-scoped structured logging service")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.yaml", env = "LANTERN_CONFIG")]
    pub config: String,

    /// Listen host (overrides config)
    #[arg(long, env = "LANTERN_HOST")]
    pub host: Option<String>,

    /// Listen port (overrides config)
    #[arg(long, env = "LANTERN_PORT")]
    pub port: Option<u16>,

    /// Minimum log level (overrides config)
    #[arg(long, env = "LANTERN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Force human-readable console logs instead of JSON
    #[arg(long)]
    pub console_logs: bool,
}
