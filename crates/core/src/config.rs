use crate::error::LogError;
use crate::level::Level;
use serde::{Deserialize, Serialize};

// ─── Config ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Logging
    pub logging: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8100,
            logging: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file, sanitize, and validate.
    pub fn load(path: &str) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml_ng::from_str(&contents)?;
        config.sanitize();
        config.validate()?;
        Ok(config)
    }

    fn sanitize(&mut self) {
        self.logging.sanitize();
    }

    /// Validate configuration. An unparseable log level is fatal here:
    /// the process must not start with ambiguous logging config.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.port == 0 {
            anyhow::bail!("port must be non-zero");
        }
        self.logging.validate()?;
        Ok(())
    }
}

// ─── LogConfig ─────────────────────────────────────────────────────────────

/// Process-wide logging configuration, applied once at startup and injected
/// into the pipeline and middleware constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogConfig {
    /// Minimum severity to emit (DEBUG/INFO/WARNING/ERROR).
    pub level: String,
    /// true → one JSON object per line; false → human-readable console lines.
    pub json_logs: bool,
    /// Static `service` field merged into every event.
    pub service_name: String,
    /// Static `environment` field merged into every event.
    pub environment: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            json_logs: true,
            service_name: "app".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl LogConfig {
    fn sanitize(&mut self) {
        self.level = self.level.trim().to_string();
        if self.service_name.trim().is_empty() {
            self.service_name = "app".to_string();
        }
    }

    pub fn min_level(&self) -> Result<Level, LogError> {
        self.level.parse()
    }

    pub fn validate(&self) -> Result<(), LogError> {
        self.min_level().map(|_| ())
    }
}
