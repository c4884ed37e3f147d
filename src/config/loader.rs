//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Env { key: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` is injected so the mapping can be exercised without touching the
/// process environment.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let port: u16 = port.parse().map_err(|e| ConfigError::Env {
            key: "PORT",
            message: format!("{e}"),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    if let Some(backend) = lookup("CONTENT_STORE") {
        config.store.backend = backend.parse().map_err(|message| ConfigError::Env {
            key: "CONTENT_STORE",
            message,
        })?;
    }
    // USE_MOCK_DB wins over CONTENT_STORE
    if lookup("USE_MOCK_DB").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        config.store.backend = crate::config::schema::StoreBackend::Memory;
    }
    if let Some(dir) = lookup("CONTENT_DIR") {
        config.store.content_dir = dir.into();
    }

    if let Some(host) = lookup("DB_HOST") {
        config.database.host = host;
    }
    if let Some(port) = lookup("DB_PORT") {
        config.database.port = port.parse().map_err(|e| ConfigError::Env {
            key: "DB_PORT",
            message: format!("{e}"),
        })?;
    }
    if let Some(name) = lookup("DB_NAME") {
        config.database.name = name;
    }
    if let Some(user) = lookup("DB_USER") {
        config.database.user = user;
    }
    if let Some(password) = lookup("DB_PASSWORD") {
        config.database.password = password;
    }

    if let Some(key) = lookup("API_KEY").filter(|k| !k.is_empty()) {
        config.security.api_key = Some(key);
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }

    if let Some(dir) = lookup("ROMS_DIR") {
        config.roms.roms_dir = Some(dir.into());
    }
    if let Some(dir) = lookup("ROM_MEDIA_DIR") {
        config.roms.media_dir = Some(dir.into());
    }

    let ss = &mut config.scrapers.screenscraper;
    overlay(&mut ss.dev_id, lookup("SCREENSCRAPER_DEV_ID"));
    overlay(&mut ss.dev_password, lookup("SCREENSCRAPER_DEV_PASSWORD"));
    overlay(&mut ss.username, lookup("SCREENSCRAPER_USER"));
    overlay(&mut ss.password, lookup("SCREENSCRAPER_PASSWORD"));

    let igdb = &mut config.scrapers.igdb;
    overlay(&mut igdb.client_id, lookup("TWITCH_CLIENT_ID"));
    overlay(&mut igdb.client_secret, lookup("TWITCH_CLIENT_SECRET"));

    Ok(())
}

fn overlay(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}
