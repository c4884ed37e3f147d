//! Resilience for outbound calls to metadata providers.
//!
//! # Data Flow
//! ```text
//! scraper request
//!     → reqwest client (per-request timeout)
//!     → retries.rs (retryable status or transport error?)
//!     → backoff.rs (exponential delay with jitter) → next attempt
//! ```
//!
//! # Design Decisions
//! - Every outbound call has a deadline set on the client
//! - Only transient failures are retried; 4xx other than 429 is final
//! - `max_attempts = 1` disables retrying entirely

pub mod backoff;
pub mod retries;

pub use retries::{is_retryable_error, is_retryable_status, RetryPolicy};
