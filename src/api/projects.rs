use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::http::error::{ApiError, ApiResult};
use crate::http::params::{parse_id, ApiPath, ApiQuery, LanguageQuery};
use crate::http::server::AppState;
use crate::models::Project;
use crate::observability::metrics;

const NOT_FOUND: &str = "Project not found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects))
        .route("/{id}", get(get_project))
}

async fn list_projects(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.stores.content.projects(query.language()?).await?;
    Ok(Json(projects))
}

async fn get_project(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let project = state
        .stores
        .content
        .project(id, query.language()?)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    metrics::record_content_view("project", &id.to_string());
    Ok(Json(project))
}
