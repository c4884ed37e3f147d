use axum::{
    extract::State,
    routing::get,
    Json, Router,
};

use crate::http::error::{ApiError, ApiResult};
use crate::http::params::{segment, ApiPath, ApiQuery, LanguageQuery};
use crate::http::server::AppState;
use crate::models::{BlogPost, BlogSummary};
use crate::observability::metrics;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{page}", get(get_post))
}

/// Summaries only, most recently updated first.
async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<Vec<BlogSummary>>> {
    let posts = state.stores.content.blog_posts(query.language()?).await?;
    Ok(Json(posts))
}

async fn get_post(
    State(state): State<AppState>,
    ApiPath(page): ApiPath<String>,
    ApiQuery(query): ApiQuery<LanguageQuery>,
) -> ApiResult<Json<BlogPost>> {
    let page = segment(&page)?;
    let post = state
        .stores
        .content
        .blog_post(page, query.language()?)
        .await?
        .ok_or(ApiError::NotFound("Blog post not found"))?;

    metrics::record_content_view("blog", page);
    Ok(Json(post))
}
