use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::http::error::{ApiError, ApiResult};
use crate::http::params::{parse_id, segment, ApiPath, ApiQuery, LanguageQuery};
use crate::http::server::AppState;
use crate::models::{GallerySummary, Photo};
use crate::observability::metrics;

const NOT_FOUND: &str = "Photo not found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/galleries", get(list_galleries))
        .route("/gallery/{name}", get(gallery_photos))
        .route("/{id}", get(get_photo))
}

async fn list_galleries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Vec<GallerySummary>>> {
    let galleries = state.stores.content.galleries(query.language()?).await?;
    Ok(Json(galleries))
}

/// An unknown gallery is an empty list, not a 404.
async fn gallery_photos(
    State(state): State<AppState>,
    ApiPath(name): ApiPath<String>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Vec<Photo>>> {
    let name = segment(&name)?;
    let photos = state
        .stores
        .content
        .gallery_photos(name, query.language()?)
        .await?;

    metrics::record_gallery_view(name);
    Ok(Json(photos))
}

async fn get_photo(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Photo>> {
    let id = parse_id(&id, NOT_FOUND)?;
    state
        .stores
        .content
        .photo(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}
