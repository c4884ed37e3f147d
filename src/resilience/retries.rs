//! Retry logic for outbound HTTP.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is worth repeating
//! - Re-send with exponential backoff + jitter until attempts run out
//!
//! # Design Decisions
//! - Retryable: 429, 502, 503, 504, connect errors and timeouts
//! - The last response is handed back as-is so callers map its status

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::config::ScraperConfig;
use crate::resilience::backoff::calculate_backoff;

pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

pub fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// Send the request built by `build`, rebuilding it for every attempt.
    pub async fn send<F>(&self, build: F) -> Result<Response, reqwest::Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let result = build().send().await;
            let retry = match &result {
                Ok(response) => is_retryable_status(response.status()),
                Err(e) => is_retryable_error(e),
            };
            if !retry || attempt >= self.max_attempts {
                return result;
            }

            let delay = calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms);
            match &result {
                Ok(response) => tracing::warn!(
                    attempt,
                    status = response.status().as_u16(),
                    delay_ms = delay.as_millis() as u64,
                    "Upstream returned retryable status"
                ),
                Err(e) => tracing::warn!(
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Upstream request failed, retrying"
                ),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ScraperConfig::default())
    }
}
