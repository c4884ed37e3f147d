use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::http::error::{ApiError, ApiResult};
use crate::http::params::{parse_id, ApiPath, ApiQuery, LanguageQuery};
use crate::http::server::AppState;
use crate::models::Paper;

const NOT_FOUND: &str = "Paper not found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_papers))
        .route("/{id}", get(get_paper))
}

/// Newest first.
async fn list_papers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Vec<Paper>>> {
    let papers = state.stores.content.papers(query.language()?).await?;
    Ok(Json(papers))
}

async fn get_paper(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Paper>> {
    let id = parse_id(&id, NOT_FOUND)?;
    state
        .stores
        .content
        .paper(id, query.language()?)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}
