pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod pipeline;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::pipeline::vision::{OpenAiVisionClient, VisionClient, VisionError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Vision client error: {0}")]
    Vision(#[from] VisionError),

    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the charting service and block until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    if config.vision_api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; vitals extraction will fail");
    }

    // Migrate up front so a bad database path fails at startup.
    db::open_database(&config.database_path)?;
    tracing::info!(path = %config.database_path.display(), "Database ready");

    // The blocking HTTP client owns its own runtime; build it outside tokio.
    let vision: Arc<dyn VisionClient> = Arc::new(OpenAiVisionClient::new(
        &config.vision_url,
        config.vision_api_key.clone(),
        config.vision_timeout_secs,
    )?);

    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::new(config, vision.clone()));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut server = api::start_api_server(core, bind_addr).await?;
        tracing::info!(addr = %server.addr, "Listening");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
        }
        server.shutdown();
        server.wait().await;
        Ok::<(), StartupError>(())
    })?;
    drop(runtime);

    // Last reference to the blocking client drops here, outside the runtime.
    drop(vision);
    Ok(())
}
