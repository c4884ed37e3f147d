//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the portfolio API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Which content store backs the API.
    pub store: StoreConfig,

    /// PostgreSQL connection settings.
    pub database: DatabaseConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// API key, headers and body limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// ROM library locations.
    pub roms: RomConfig,

    /// Third-party metadata scrapers.
    pub scrapers: ScraperConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3080".to_string(),
        }
    }
}

/// Content store selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
    Files,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mock" => Ok(Self::Memory),
            "files" | "file" => Ok(Self::Files),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// Root of the JSON/Markdown content tree (files backend only).
    pub content_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgres,
            content_dir: PathBuf::from("content"),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,

    /// Pool size.
    pub max_connections: u32,

    /// Time allowed to acquire a connection, in seconds.
    pub connect_timeout_secs: u64,

    /// Idle connections are closed after this many seconds.
    pub idle_timeout_secs: u64,

    /// Apply `migrations/` on startup.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            name: "portfolio".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 20,
            connect_timeout_secs: 2,
            idle_timeout_secs: 30,
            run_migrations: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// Scans and scrapes run inside this budget too.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Bearer token required for mutating requests. `None` disables them (503).
    pub api_key: Option<String>,
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            enable_headers: true,
            max_body_size: 1024 * 1024, // 1MB
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Serve `/metrics` and record request metrics.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

/// ROM library configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RomConfig {
    /// Directory holding one subdirectory per console.
    pub roms_dir: Option<PathBuf>,

    /// Where scraped images are written. Unset keeps remote URLs.
    pub media_dir: Option<PathBuf>,

    /// Public URL prefix under which `media_dir` is served.
    pub media_url_prefix: String,
}

impl Default for RomConfig {
    fn default() -> Self {
        Self {
            roms_dir: None,
            media_dir: None,
            media_url_prefix: "/images/roms".to_string(),
        }
    }
}

/// Outbound scraper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Attempts per outbound request (1 = no retry).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    pub screenscraper: ScreenScraperConfig,

    pub igdb: IgdbConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            max_attempts: 1,
            base_delay_ms: 250,
            max_delay_ms: 2000,
            screenscraper: ScreenScraperConfig::default(),
            igdb: IgdbConfig::default(),
        }
    }
}

/// ScreenScraper API credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScreenScraperConfig {
    pub base_url: String,
    pub dev_id: Option<String>,
    pub dev_password: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub softname: String,
}

impl Default for ScreenScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.screenscraper.fr/api2".to_string(),
            dev_id: None,
            dev_password: None,
            username: None,
            password: None,
            softname: "portfolio-api".to_string(),
        }
    }
}

/// IGDB API credentials (Twitch application).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IgdbConfig {
    pub base_url: String,
    pub token_url: String,
    pub image_base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Default for IgdbConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.igdb.com/v4".to_string(),
            token_url: "https://id.twitch.tv/oauth2/token".to_string(),
            image_base_url: "https://images.igdb.com/igdb/image/upload".to_string(),
            client_id: None,
            client_secret: None,
        }
    }
}
