//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP middleware, stores, scrapers
//!     → logging.rs  (tracing subscriber, pretty or JSON)
//!     → metrics.rs  (counters, gauges, histograms via `metrics`)
//!     → visitors.rs (daily unique-visitor dedup)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Metric calls are no-ops until a recorder is installed, so tests need no setup
//! - Route labels are normalised before they reach the recorder

pub mod logging;
pub mod metrics;
pub mod visitors;

pub use visitors::VisitorTracker;
