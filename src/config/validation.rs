//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool size > 0)
//! - Check that the selected store has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{AppConfig, StoreBackend};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("store.content_dir must be set for the files store")]
    MissingContentDir,

    #[error("scrapers.base_delay_ms must not exceed scrapers.max_delay_ms")]
    BackoffRange,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    match config.store.backend {
        StoreBackend::Postgres if config.database.max_connections == 0 => {
            errors.push(ValidationError::Zero("database.max_connections"));
        }
        StoreBackend::Files if config.store.content_dir.as_os_str().is_empty() => {
            errors.push(ValidationError::MissingContentDir);
        }
        _ => {}
    }

    let scrapers = &config.scrapers;
    if scrapers.max_attempts == 0 {
        errors.push(ValidationError::Zero("scrapers.max_attempts"));
    }
    if scrapers.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("scrapers.request_timeout_secs"));
    }
    if scrapers.base_delay_ms > scrapers.max_delay_ms {
        errors.push(ValidationError::BackoffRange);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
