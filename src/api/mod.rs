//! REST handlers, one module per resource.
//!
//! Handlers stay thin: parse parameters, call the store, map `None` to 404.

pub mod blog;
pub mod content;
pub mod health;
pub mod papers;
pub mod photos;
pub mod projects;
pub mod roms;

use axum::{middleware, routing::get, Router};

use crate::http::middleware::require_api_key;
use crate::http::server::AppState;

/// Every `/api` route. Mutating ROM routes sit behind the API key.
pub fn router(state: &AppState) -> Router<AppState> {
    let roms = roms::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_api_key,
    ));

    Router::new()
        .nest("/api/content", content::routes())
        .nest("/api/projects", projects::routes())
        .nest("/api/papers", papers::routes())
        .nest("/api/photos", photos::routes())
        .nest("/api/blog", blog::routes())
        .nest("/api/roms", roms)
        .route("/api/health", get(health::health))
}
