//! Metadata scraping against mock ScreenScraper and IGDB upstreams.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

mod common;

use common::{bind_upstream, serve_upstream, start_server, start_upstream, test_config, API_KEY};

fn screenscraper_game(base: &str) -> Value {
    json!({
        "header": {"success": "true"},
        "response": {
            "jeu": {
                "id": "3195",
                "noms": [{"region": "wor", "text": "Super Mario World"}],
                "synopsis": [{"langue": "en", "text": "Mario sets out to save Dinosaur Land."}],
                "dates": [{"region": "us", "text": "1991-08-13"}],
                "genres": [{"id": "7", "noms": [{"langue": "en", "text": "Platform"}]}],
                "medias": [
                    {"type": "box-2D", "region": "us", "url": format!("{base}/media/box"), "format": "png"},
                    {"type": "ss", "region": "wor", "url": format!("{base}/media/ss1"), "format": "png"}
                ]
            }
        }
    })
}

/// Known ROM names answer with a game, Sonic fails, everything else is 404.
async fn jeu_infos(
    State(base): State<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if params.get("devid").map(String::as_str) != Some("dev") {
        return (StatusCode::FORBIDDEN, "bad credentials").into_response();
    }
    match params.get("romnom").map(String::as_str) {
        Some("Super Mario World (USA).sfc") => Json(screenscraper_game(&base)).into_response(),
        Some(name) if name.starts_with("Sonic") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "database offline").into_response()
        }
        _ => (StatusCode::NOT_FOUND, "Erreur : Rom/Iso/Dossier non trouvée !").into_response(),
    }
}

async fn start_screenscraper() -> String {
    let (listener, base) = bind_upstream().await;
    let router = Router::new()
        .route("/jeuInfos.php", get(jeu_infos))
        .route("/media/box", get(|| async { ([("content-type", "image/png")], "PNGDATA") }))
        .route("/media/ss1", get(|| async { ([("content-type", "image/png")], "PNGDATA") }))
        .with_state(base.clone());
    serve_upstream(listener, router);
    base
}

fn screenscraper_config(base: &str) -> portfolio_api::AppConfig {
    let mut config = test_config();
    config.scrapers.screenscraper.base_url = base.to_string();
    config.scrapers.screenscraper.dev_id = Some("dev".into());
    config.scrapers.screenscraper.dev_password = Some("secret".into());
    config
}

#[tokio::test]
async fn test_screenscraper_scrape_updates_game() {
    let base = start_screenscraper().await;
    let server = start_server(screenscraper_config(&base)).await;

    let res = server
        .client
        .post(server.url("/api/roms/1/scrape"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let game: Value = res.json().await.unwrap();
    assert_eq!(game["description"], "Mario sets out to save Dinosaur Land.");
    assert_eq!(game["year"], 1991);
    assert_eq!(game["tags"], json!(["Platform"]));
    assert_eq!(game["box_art_url"], format!("{base}/media/box"));
    assert_eq!(game["screenshots"], json!([format!("{base}/media/ss1")]));

    // persisted
    let stored: Value = server
        .client
        .get(server.url("/api/roms/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["year"], 1991);
}

#[tokio::test]
async fn test_screenscraper_misses_and_failures() {
    let base = start_screenscraper().await;
    let server = start_server(screenscraper_config(&base)).await;

    let res = server
        .client
        .post(server.url("/api/roms/2/scrape"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No metadata match found");

    let res = server
        .client
        .post(server.url("/api/roms/3/scrape"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let res = server
        .client
        .post(server.url("/api/roms/999/scrape"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Game not found");
}

#[tokio::test]
async fn test_scraped_images_are_stored_locally() {
    let base = start_screenscraper().await;
    let media = tempfile::tempdir().unwrap();
    let mut config = screenscraper_config(&base);
    config.roms.media_dir = Some(media.path().to_path_buf());
    let server = start_server(config).await;

    let game: Value = server
        .client
        .post(server.url("/api/roms/1/scrape"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(game["box_art_url"], "/images/roms/snes/1-box.png");
    assert_eq!(game["screenshots"], json!(["/images/roms/snes/1-ss1.png"]));
    assert!(media.path().join("snes/1-box.png").is_file());
    assert!(media.path().join("snes/1-ss1.png").is_file());
}

#[derive(Default)]
struct Twitch {
    token_requests: AtomicU32,
}

async fn token(State(twitch): State<Arc<Twitch>>) -> Json<Value> {
    twitch.token_requests.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "access_token": "tok", "expires_in": 3600, "token_type": "bearer" }))
}

async fn games(headers: HeaderMap, body: String) -> impl IntoResponse {
    let authorized = headers.get("authorization").and_then(|v| v.to_str().ok())
        == Some("Bearer tok")
        && headers.get("client-id").and_then(|v| v.to_str().ok()) == Some("client");
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body.contains("\"Chrono Trigger\"") {
        Json(json!([{
            "id": 1,
            "name": "Chrono Trigger",
            "summary": "Time travel.",
            "first_release_date": 794880000,
            "genres": [{"id": 12, "name": "Role-playing (RPG)"}],
            "cover": {"id": 9, "image_id": "co1abc"},
            "screenshots": [{"image_id": "s1"}]
        }]))
        .into_response()
    } else {
        Json(json!([])).into_response()
    }
}

#[tokio::test]
async fn test_igdb_scrape_reuses_token() {
    let twitch = Arc::new(Twitch::default());
    let base = start_upstream(
        Router::new()
            .route("/oauth2/token", post(token))
            .route("/games", post(games))
            .with_state(twitch.clone()),
    )
    .await;

    let mut config = test_config();
    config.scrapers.igdb.base_url = base.clone();
    config.scrapers.igdb.token_url = format!("{base}/oauth2/token");
    config.scrapers.igdb.image_base_url = "https://img.test".into();
    config.scrapers.igdb.client_id = Some("client".into());
    config.scrapers.igdb.client_secret = Some("secret".into());
    let server = start_server(config).await;

    let res = server
        .client
        .post(server.url("/api/roms/2/igdb"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let game: Value = res.json().await.unwrap();
    assert_eq!(game["year"], 1995);
    assert_eq!(game["box_art_url"], "https://img.test/t_cover_big/co1abc.jpg");
    assert_eq!(game["tags"], json!(["Role-playing (RPG)"]));

    let res = server
        .client
        .post(server.url("/api/roms/3/igdb"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(twitch.token_requests.load(Ordering::SeqCst), 1);
}

/// Issues `tok1`, `tok2`, ... and only accepts the newest.
async fn rotating_token(State(twitch): State<Arc<Twitch>>) -> Json<Value> {
    let issued = twitch.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "access_token": format!("tok{issued}"), "expires_in": 3600 }))
}

async fn games_newest_token(
    State(twitch): State<Arc<Twitch>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let newest = format!("Bearer tok{}", twitch.token_requests.load(Ordering::SeqCst));
    let authorization = headers.get("authorization").and_then(|v| v.to_str().ok());
    if authorization != Some(newest.as_str()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!([{ "name": "Chrono Trigger", "first_release_date": 794880000 }])).into_response()
}

#[tokio::test]
async fn test_igdb_refreshes_revoked_token() {
    let twitch = Arc::new(Twitch::default());
    let base = start_upstream(
        Router::new()
            .route("/oauth2/token", post(rotating_token))
            .route("/games", post(games_newest_token))
            .with_state(twitch.clone()),
    )
    .await;

    let mut config = test_config();
    config.scrapers.igdb.base_url = base.clone();
    config.scrapers.igdb.token_url = format!("{base}/oauth2/token");
    config.scrapers.igdb.client_id = Some("client".into());
    config.scrapers.igdb.client_secret = Some("secret".into());
    let server = start_server(config).await;

    let scrape = |id: i32| {
        server
            .client
            .post(server.url(&format!("/api/roms/{id}/igdb")))
            .bearer_auth(API_KEY)
            .send()
    };

    assert_eq!(scrape(2).await.unwrap().status(), StatusCode::OK);
    assert_eq!(twitch.token_requests.load(Ordering::SeqCst), 1);

    // revoke tok1 behind the client's back
    twitch.token_requests.fetch_add(1, Ordering::SeqCst);

    let res = scrape(2).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let game: Value = res.json().await.unwrap();
    assert_eq!(game["year"], 1995);
    assert_eq!(twitch.token_requests.load(Ordering::SeqCst), 3);
}
