pub mod analytics; // Report engine: validation, fetch/join, aggregation
pub mod api; // HTTP surface under /api/
pub mod config;
pub mod models; // Row shapes of the store tables
pub mod store; // Row store abstraction (REST + in-memory)

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{AnalyticsServer, ServerError};
use crate::config::{AnalyticsConfig, ConfigError};
use crate::store::{RestStore, StoreError};

/// Reasons the service can fail to come up or shut down cleanly.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Row store client error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Runs the analytics service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AnalyticsConfig::from_env()?;
    let store = Arc::new(RestStore::from_config(&config)?);
    tracing::info!(store = %config.store_url, page_size = config.page_size, "Row store configured");

    let mut server = AnalyticsServer::start(config.bind_addr, store).await?;

    let signal = tokio::signal::ctrl_c().await;
    server.shutdown();
    server.wait().await;

    signal.map_err(StartupError::Signal)
}
