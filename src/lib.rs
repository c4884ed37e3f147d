//! Portfolio content API library

pub mod api;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod resilience;
pub mod roms;
pub mod store;

pub use config::AppConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
