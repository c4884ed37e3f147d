//! Per-request metrics and visitor accounting.

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Method, Request},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::observability::{metrics, VisitorTracker};

/// Client address: first `X-Forwarded-For` hop, else the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Holds the in-progress gauge up until dropped, including when the request
/// future is cancelled.
struct InFlight {
    method: Method,
}

impl InFlight {
    fn start(method: Method) -> Self {
        metrics::request_started(method.as_str());
        Self { method }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::request_finished(self.method.as_str());
    }
}

pub async fn track_requests(
    State(visitors): State<Arc<VisitorTracker>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let in_flight = InFlight::start(method.clone());

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    if let Some(visitor) = client_ip(request.headers(), peer) {
        if visitors.observe_now(&visitor) {
            let user_agent = request
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok());
            metrics::record_unique_visitor(metrics::user_agent_type(user_agent));
        }
    }

    if method == Method::GET {
        if let Some(section) = metrics::page_section(&path) {
            metrics::record_page_view(&path, section);
        }
    }

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let route = metrics::normalize_route(&path);
    drop(in_flight);
    metrics::record_request(method.as_str(), &route, status, start);

    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .or_else(|| response.body().size_hint().exact());
    if let Some(bytes) = length {
        metrics::record_response_size(method.as_str(), &route, status, bytes);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn test_in_flight_released_on_drop() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            let first = InFlight::start(Method::POST);
            let second = InFlight::start(Method::POST);
            drop(first);
            assert!(handle
                .render()
                .contains(r#"portfolio_http_requests_in_progress{method="POST"} 1"#));
            drop(second);
        });

        assert!(handle
            .render()
            .contains(r#"portfolio_http_requests_in_progress{method="POST"} 0"#));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("10.0.0.9"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
