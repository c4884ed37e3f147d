//! Bearer-key protection for mutating ROM endpoints.

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Reads pass through. Writes need `Authorization: Bearer <api_key>`.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }

    let Some(api_key) = state.config.security.api_key.as_deref() else {
        tracing::error!("API key not configured, rejecting write request");
        return ApiError::Unavailable("Authentication not configured".to_string()).into_response();
    };

    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|token| token == api_key);

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected unauthenticated write"
    );
    ApiError::Unauthorized.into_response()
}
