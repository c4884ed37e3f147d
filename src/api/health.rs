use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::http::server::AppState;

/// Liveness. Does not touch the store.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "Server is running" }))
}

/// Prometheus exposition of the process recorder.
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
