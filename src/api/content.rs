use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use std::collections::BTreeMap;

use crate::http::error::{ApiError, ApiResult};
use crate::http::params::{segment, ApiPath};
use crate::http::server::AppState;
use crate::models::ContentEntry;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{language}", get(all_content))
        .route("/{language}/{key}", get(content_by_key))
}

/// Every UI string of a language as one `{key: value}` object.
async fn all_content(
    State(state): State<AppState>,
    ApiPath(language): ApiPath<String>,
) -> ApiResult<Json<BTreeMap<String, String>>> {
    let language = segment(&language)?;
    let entries = state.stores.content.content_entries(language).await?;
    Ok(Json(
        entries.into_iter().map(|e| (e.key, e.value)).collect(),
    ))
}

async fn content_by_key(
    State(state): State<AppState>,
    ApiPath((language, key)): ApiPath<(String, String)>,
) -> ApiResult<Json<ContentEntry>> {
    let language = segment(&language)?;
    state
        .stores
        .content
        .content_entry(language, &key)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Content not found"))
}
