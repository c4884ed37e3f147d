//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides: PORT, USE_MOCK_DB, DB_*, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to handlers and stores
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, DatabaseConfig, IgdbConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RomConfig, ScraperConfig, ScreenScraperConfig, SecurityConfig, StoreBackend, StoreConfig,
};
