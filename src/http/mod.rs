//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum Router, tower-http layers)
//!     → middleware/metrics.rs (request metrics, visitors)
//!     → middleware/auth.rs (API key on ROM writes)
//!     → api::* handlers (params.rs for shared parameter rules)
//!     → error.rs (ApiError → JSON error body)
//! ```

pub mod error;
pub mod middleware;
pub mod params;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{AppState, HttpServer};
