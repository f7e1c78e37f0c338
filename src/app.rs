//! Application struct that encapsulates server assembly and serving logic.

use crate::cli::Cli;
use anyhow::Context as _;
use lantern_core::config::Config;
use lantern_core::pipeline::Logger;
use lantern_server::AppState;
use serde_json::json;
use std::sync::Arc;

pub struct Application {
    config: Arc<Config>,
    app_router: axum::Router,
    logger: Logger,
}

impl Application {
    /// Load config, apply CLI overrides, build the pipeline and router.
    /// A bad logging config (unknown level) is fatal here.
    pub fn build(args: &Cli) -> anyhow::Result<Self> {
        let mut config = if std::path::Path::new(&args.config).exists() {
            Config::load(&args.config)
                .with_context(|| format!("loading config from '{}'", args.config))?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = args.host {
            config.host = host.clone();
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if let Some(ref level) = args.log_level {
            config.logging.level = level.clone();
        }
        if args.console_logs {
            config.logging.json_logs = false;
        }
        config.validate()?;

        let pipeline = lantern_core::init(&config.logging)?;
        let logger = pipeline.logger("lantern");

        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            pipeline,
        };
        let app_router = lantern_server::build_router(state);

        Ok(Self {
            config,
            app_router,
            logger,
        })
    }

    /// Bind and serve until ctrl-c.
    pub async fn serve(self) -> anyhow::Result<()> {
        let Self {
            config,
            app_router,
            logger,
        } = self;

        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        logger.info("server_started", &[("addr", json!(addr))]);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };

        axum::serve(listener, app_router)
            .with_graceful_shutdown(shutdown)
            .await?;

        logger.info("server_stopped", &[]);
        Ok(())
    }
}
