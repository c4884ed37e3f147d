//! Startup orchestration.
//!
//! Subsystems initialise in dependency order and any failure is fatal. The
//! listener is bound by the caller once the state is ready.

use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::http::server::AppState;
use crate::observability::{metrics, VisitorTracker};
use crate::roms::Scrapers;
use crate::store::{StoreError, Stores};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store initialisation failed: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP client initialisation failed: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build the stores selected by `config`, then the rest of the state.
pub async fn build_state(config: AppConfig) -> Result<AppState, StartupError> {
    let stores = Stores::from_config(&config).await?;
    build_state_with(config, stores)
}

/// Assemble the shared state around already built stores.
pub fn build_state_with(config: AppConfig, stores: Stores) -> Result<AppState, StartupError> {
    let scrapers = Scrapers::from_config(&config.roms, &config.scrapers)?;
    let metrics = if config.observability.metrics_enabled {
        metrics::init_metrics()
    } else {
        None
    };

    Ok(AppState {
        stores,
        config: Arc::new(config),
        scrapers: Arc::new(scrapers),
        visitors: Arc::new(VisitorTracker::new()),
        metrics,
    })
}
