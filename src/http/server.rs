//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with every API route
//! - Wire up middleware (tracing, request id, timeout, body limit, CORS,
//!   security headers, metrics)
//! - Serve on a bound listener until shutdown

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::config::{AppConfig, SecurityConfig};
use crate::http::error::ApiError;
use crate::http::middleware::track_requests;
use crate::observability::VisitorTracker;
use crate::roms::Scrapers;
use crate::store::Stores;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: Arc<AppConfig>,
    pub scrapers: Arc<Scrapers>,
    pub visitors: Arc<VisitorTracker>,
    /// Present when metrics are enabled and the recorder is ours.
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server for the portfolio API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Run the server on `listener` until `shutdown` resolves, then drain
    /// in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = api::router(&state);
    if state.metrics.is_some() {
        router = router.route("/metrics", get(api::health::metrics));
    }
    let mut router = router
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone());

    if config.security.enable_headers {
        router = router
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ));
    }

    router = router
        .layer(cors_layer(&config.security))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    // outside the timeout so 408s and 413s are counted too
    if config.observability.metrics_enabled {
        router = router.layer(middleware::from_fn_with_state(
            state.visitors.clone(),
            track_requests,
        ));
    }

    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Any origin unless `cors_allowed_origins` lists some.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if security.cors_allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found")
}

async fn method_not_allowed() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(serde_json::json!({ "error": "Method not allowed" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state(config: AppConfig) -> AppState {
        let store = Arc::new(MemoryStore::seeded().unwrap());
        AppState {
            stores: Stores {
                content: store.clone(),
                roms: store,
            },
            config: Arc::new(config),
            scrapers: Arc::new(Scrapers::disabled()),
            visitors: Arc::new(VisitorTracker::new()),
            metrics: None,
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.observability.metrics_enabled = false;
        config
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = build_router(state(config()));
        let res = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Not found"}"#);
    }

    #[tokio::test]
    async fn test_metrics_route_needs_recorder() {
        let app = build_router(state(config()));
        let res = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_request_id_and_cors() {
        let mut config = config();
        config.security.cors_allowed_origins = vec!["https://example.com".into()];
        let app = build_router(state(config));

        let res = app
            .oneshot(
                Request::get("/api/health")
                    .header("origin", "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(
            res.headers()["access-control-allow-origin"],
            "https://example.com"
        );
    }

    #[tokio::test]
    async fn test_body_limit() {
        let mut config = config();
        config.security.max_body_size = 16;
        config.security.api_key = Some("k".into());
        let app = build_router(state(config));

        let res = app
            .oneshot(
                Request::put("/api/roms/1")
                    .header("authorization", "Bearer k")
                    .header("content-length", "64")
                    .body(Body::from(vec![b' '; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
