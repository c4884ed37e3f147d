//! Metrics collection and exposition.
//!
//! # Metrics
//! - `portfolio_http_requests_total` (counter): requests by method, route, status
//! - `portfolio_http_request_duration_seconds` (histogram): latency distribution
//! - `portfolio_http_requests_in_progress` (gauge): in-flight requests by method
//! - `portfolio_http_response_size_bytes` (histogram): when Content-Length is known
//! - `portfolio_errors_total` (counter): 4xx as `client`, 5xx as `server`
//! - `portfolio_page_views_total`, `portfolio_unique_visitors_total`
//! - `portfolio_content_interactions_total`, `portfolio_gallery_views_total`
//! - `portfolio_db_query_duration_seconds`, `portfolio_db_query_errors_total`
//! - `portfolio_scrape_attempts_total` (counter): by source and outcome
//!
//! # Design Decisions
//! - One process-wide Prometheus recorder, rendered by `GET /metrics`
//! - Histogram buckets tuned for typical web latencies

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;
use std::sync::{LazyLock, OnceLock};
use std::time::Instant;

const HTTP_REQUESTS_TOTAL: &str = "portfolio_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "portfolio_http_request_duration_seconds";
const HTTP_REQUESTS_IN_PROGRESS: &str = "portfolio_http_requests_in_progress";
const HTTP_RESPONSE_SIZE: &str = "portfolio_http_response_size_bytes";
const ERRORS_TOTAL: &str = "portfolio_errors_total";
const PAGE_VIEWS_TOTAL: &str = "portfolio_page_views_total";
const UNIQUE_VISITORS_TOTAL: &str = "portfolio_unique_visitors_total";
const CONTENT_INTERACTIONS_TOTAL: &str = "portfolio_content_interactions_total";
const GALLERY_VIEWS_TOTAL: &str = "portfolio_gallery_views_total";
const DB_QUERY_DURATION: &str = "portfolio_db_query_duration_seconds";
const DB_QUERY_ERRORS: &str = "portfolio_db_query_errors_total";
const SCRAPE_ATTEMPTS_TOTAL: &str = "portfolio_scrape_attempts_total";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.015, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 1.0, 2.0, 5.0,
];
const SIZE_BUCKETS: &[f64] = &[
    100.0, 1_000.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 500_000.0, 1_000_000.0,
];
const DB_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0];

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static SLUG_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").unwrap());

/// Install the global Prometheus recorder once and return its handle.
///
/// Later calls return the same handle. `None` means another recorder was
/// already installed or the exporter could not be built.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE.get_or_init(install_recorder).clone()
}

fn install_recorder() -> Option<PrometheusHandle> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(HTTP_REQUEST_DURATION.to_string()), LATENCY_BUCKETS)
        .and_then(|b| {
            b.set_buckets_for_metric(Matcher::Full(HTTP_RESPONSE_SIZE.to_string()), SIZE_BUCKETS)
        })
        .and_then(|b| b.set_buckets_for_metric(Matcher::Full(DB_QUERY_DURATION.to_string()), DB_BUCKETS));

    let recorder = match builder {
        Ok(builder) => builder.build_recorder(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to configure Prometheus exporter");
            return None;
        }
    };

    let handle = recorder.handle();
    if let Err(e) = metrics::set_global_recorder(recorder) {
        tracing::warn!(error = %e, "Metrics recorder already installed");
        return None;
    }

    tracing::info!("Prometheus metrics recorder installed");
    Some(handle)
}

/// Record a completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status_code", status.to_string()),
    ];
    counter!(HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(HTTP_REQUEST_DURATION, &labels).record(start.elapsed().as_secs_f64());

    if status >= 400 {
        let kind = if status >= 500 { "server" } else { "client" };
        counter!(
            ERRORS_TOTAL,
            "type" => kind,
            "route" => route.to_string(),
            "status_code" => status.to_string()
        )
        .increment(1);
    }
}

pub fn request_started(method: &str) {
    gauge!(HTTP_REQUESTS_IN_PROGRESS, "method" => method.to_string()).increment(1.0);
}

pub fn request_finished(method: &str) {
    gauge!(HTTP_REQUESTS_IN_PROGRESS, "method" => method.to_string()).decrement(1.0);
}

pub fn record_response_size(method: &str, route: &str, status: u16, bytes: u64) {
    histogram!(
        HTTP_RESPONSE_SIZE,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status_code" => status.to_string()
    )
    .record(bytes as f64);
}

pub fn record_page_view(page: &str, section: &'static str) {
    counter!(PAGE_VIEWS_TOTAL, "page" => page.to_string(), "section" => section).increment(1);
}

/// Client location is not resolved, so `country` is always `unknown`.
pub fn record_unique_visitor(user_agent_type: &'static str) {
    counter!(
        UNIQUE_VISITORS_TOTAL,
        "country" => "unknown",
        "user_agent_type" => user_agent_type
    )
    .increment(1);
}

pub fn record_content_view(content_type: &'static str, content_id: &str) {
    counter!(
        CONTENT_INTERACTIONS_TOTAL,
        "content_type" => content_type,
        "content_id" => content_id.to_string(),
        "action" => "view"
    )
    .increment(1);
}

pub fn record_gallery_view(gallery_name: &str) {
    counter!(GALLERY_VIEWS_TOTAL, "gallery_name" => gallery_name.to_string()).increment(1);
}

pub fn record_db_query(operation: &'static str, table: &'static str, start: Instant) {
    histogram!(DB_QUERY_DURATION, "operation" => operation, "table" => table)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_db_error(operation: &'static str, table: &'static str, error_type: &'static str) {
    counter!(
        DB_QUERY_ERRORS,
        "operation" => operation,
        "table" => table,
        "error_type" => error_type
    )
    .increment(1);
}

/// `outcome` is `matched`, `no_match` or `error`.
pub fn record_scrape(source: &'static str, outcome: &'static str) {
    counter!(SCRAPE_ATTEMPTS_TOTAL, "source" => source, "outcome" => outcome).increment(1);
}

/// Collapse ids, UUIDs and long slugs so route labels stay bounded.
pub fn normalize_route(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                ":id"
            } else if UUID_SEGMENT.is_match(segment) {
                ":uuid"
            } else if SLUG_SEGMENT.is_match(segment) {
                ":slug"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Content section a path belongs to, for page-view accounting.
pub fn page_section(path: &str) -> Option<&'static str> {
    [
        ("/api/blog", "blog"),
        ("/api/projects", "projects"),
        ("/api/photos", "photos"),
        ("/api/papers", "papers"),
        ("/api/content", "content"),
    ]
    .into_iter()
    .find(|(prefix, _)| path.starts_with(prefix))
    .map(|(_, section)| section)
}

pub fn user_agent_type(user_agent: Option<&str>) -> &'static str {
    match user_agent {
        None | Some("") => "unknown",
        Some(ua) if ua.contains("Mobile") => "mobile",
        Some(ua) if ua.contains("Tablet") => "tablet",
        Some(ua) if ua.contains("bot") || ua.contains("Bot") => "bot",
        Some(_) => "desktop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/api/projects/42"), "/api/projects/:id");
        assert_eq!(normalize_route("/api/roms/7/scrape"), "/api/roms/:id/scrape");
        assert_eq!(
            normalize_route("/api/x/550e8400-e29b-41d4-a716-446655440000"),
            "/api/x/:uuid"
        );
        assert_eq!(
            normalize_route("/api/blog/recording-tools?language=en"),
            "/api/blog/:slug"
        );
        assert_eq!(normalize_route("/api/blog/hello"), "/api/blog/hello");
        assert_eq!(normalize_route("/api/photos/galleries"), "/api/photos/galleries");
        assert_eq!(normalize_route("/"), "/");
    }

    #[test]
    fn test_page_section() {
        assert_eq!(page_section("/api/blog/hello"), Some("blog"));
        assert_eq!(page_section("/api/content/en"), Some("content"));
        assert_eq!(page_section("/api/roms"), None);
        assert_eq!(page_section("/api/health"), None);
    }

    #[test]
    fn test_user_agent_type() {
        assert_eq!(user_agent_type(None), "unknown");
        assert_eq!(
            user_agent_type(Some("Mozilla/5.0 (iPhone) Mobile/15E148")),
            "mobile"
        );
        assert_eq!(user_agent_type(Some("Googlebot/2.1")), "bot");
        assert_eq!(user_agent_type(Some("Mozilla/5.0 (X11; Linux x86_64)")), "desktop");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("GET", "/api/health", 200, Instant::now());
        record_request("GET", "/missing", 404, Instant::now());
        record_scrape("igdb", "matched");
    }
}
