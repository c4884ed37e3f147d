use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    routing::{get, post},
    Json, Router,
};

use crate::http::error::{ApiError, ApiResult};
use crate::http::params::{parse_id, ApiPath};
use crate::http::server::AppState;
use crate::models::{RomFilter, RomGame, RomUpdate};
use crate::roms::{self, MetadataSource, ScanSummary};

const NOT_FOUND: &str = "Game not found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_games))
        .route("/consoles", get(list_consoles))
        .route("/scan", post(scan_roms))
        .route("/{id}", get(get_game).put(update_game))
        .route("/{id}/scrape", post(screenscraper_scrape))
        .route("/{id}/igdb", post(igdb_scrape))
}

/// `?console=&search=&tags=a&tags=b`. Only available games are listed.
async fn list_games(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Vec<RomGame>>> {
    let filter = RomFilter::from_query(query.as_deref());
    let games = state.stores.roms.list_games(&filter).await?;
    Ok(Json(games))
}

async fn list_consoles(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.stores.roms.consoles().await?))
}

async fn get_game(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<RomGame>> {
    let id = parse_id(&id, NOT_FOUND)?;
    state
        .stores
        .roms
        .game(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(NOT_FOUND))
}

async fn update_game(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    body: Bytes,
) -> ApiResult<Json<RomGame>> {
    let id = parse_id(&id, NOT_FOUND)?;
    let update: RomUpdate = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?;

    let game = state
        .stores
        .roms
        .update_game(id, &update)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;

    tracing::info!(game_id = id, "Game updated");
    Ok(Json(game))
}

async fn scan_roms(State(state): State<AppState>) -> ApiResult<Json<ScanSummary>> {
    let summary = roms::scan(
        state.stores.roms.as_ref(),
        state.config.roms.roms_dir.as_deref(),
    )
    .await?;
    Ok(Json(summary))
}

async fn screenscraper_scrape(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<RomGame>> {
    let source = state.scrapers.screenscraper()?;
    scrape(&state, source, &id).await
}

async fn igdb_scrape(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<RomGame>> {
    let source = state.scrapers.igdb()?;
    scrape(&state, source, &id).await
}

async fn scrape(state: &AppState, source: &dyn MetadataSource, id: &str) -> ApiResult<Json<RomGame>> {
    let id = parse_id(id, NOT_FOUND)?;
    let game = roms::scrape_game(
        source,
        state.stores.roms.as_ref(),
        state.scrapers.media.as_ref(),
        id,
    )
    .await?;
    Ok(Json(game))
}
