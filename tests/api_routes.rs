//! End-to-end tests for the content and ROM routes over the memory store.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{start_server, test_config, API_KEY};

#[tokio::test]
async fn test_health() {
    let server = start_server(test_config()).await;
    let res = server.client.get(server.url("/api/health")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_content_by_language() {
    let server = start_server(test_config()).await;

    let en: Value = server
        .client
        .get(server.url("/api/content/en"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(en["welcome"], "Welcome to the portfolio");
    assert_eq!(en["menu.roms"], "ROM Library");

    let entry: Value = server
        .client
        .get(server.url("/api/content/gr/welcome"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(entry["value"], "Καλώς ήρθατε");

    let missing = server
        .client
        .get(server.url("/api/content/gr/menu.roms"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Content not found");
}

#[tokio::test]
async fn test_projects_and_papers_ordering() {
    let server = start_server(test_config()).await;

    let projects: Vec<Value> = server
        .client
        .get(server.url("/api/projects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = projects.iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let papers: Vec<Value> = server
        .client
        .get(server.url("/api/papers?language=en"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let years: Vec<i64> = papers.iter().map(|p| p["year"].as_i64().unwrap()).collect();
    assert_eq!(years, vec![2023, 2022, 2021]);
    assert!(papers[0]["abstract"].is_string());

    let greek: Vec<Value> = server
        .client
        .get(server.url("/api/projects?language=gr"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(greek.len(), 2);
}

#[tokio::test]
async fn test_lookup_misses() {
    let server = start_server(test_config()).await;

    for path in [
        "/api/projects/999",
        "/api/projects/abc",
        "/api/papers/4",
        "/api/blog/no-such-post",
        "/api/photos/999",
        "/api/nowhere",
    ] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = res.json().await.unwrap();
        assert!(body["error"].is_string(), "{path}");
    }

    let res = server
        .client
        .get(server.url("/api/projects?language=.."))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blog() {
    let server = start_server(test_config()).await;

    let posts: Vec<Value> = server
        .client
        .get(server.url("/api/blog"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pages: Vec<&str> = posts.iter().map(|p| p["page_name"].as_str().unwrap()).collect();
    assert_eq!(pages, vec!["recording-tools", "hello-world"]);
    assert!(posts[0].get("content").is_none());

    let post: Value = server
        .client
        .get(server.url("/api/blog/hello-world?language=gr"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(post["title"], "Γεια σου, Κόσμε");
    assert!(post["content"].as_str().unwrap().starts_with('#'));
}

#[tokio::test]
async fn test_photos() {
    let server = start_server(test_config()).await;

    let galleries: Vec<Value> = server
        .client
        .get(server.url("/api/photos/galleries"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = galleries
        .iter()
        .map(|g| g["gallery_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Archaeological Sites", "Cricket Memories"]);
    assert_eq!(galleries[1]["gallery_tags"], json!(["cricket", "sports"]));

    let photos: Vec<Value> = server
        .client
        .get(server.url("/api/photos/gallery/Cricket%20Memories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = photos.iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(photos[0]["taken_date"], "2023-08-15");

    let empty: Vec<Value> = server
        .client
        .get(server.url("/api/photos/gallery/Nothing%20Here"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty.is_empty());

    let photo: Value = server
        .client
        .get(server.url("/api/photos/4"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(photo["language"], "gr");
}

#[tokio::test]
async fn test_rom_listing_and_filters() {
    let server = start_server(test_config()).await;

    let games: Vec<Value> = server
        .client
        .get(server.url("/api/roms"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles: Vec<&str> = games.iter().map(|g| g["title"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        vec!["Sonic the Hedgehog", "Chrono Trigger", "Super Mario World"]
    );

    let platformers: Vec<Value> = server
        .client
        .get(server.url("/api/roms?console=snes&tags=platformer"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(platformers.len(), 1);
    assert_eq!(platformers[0]["id"], 1);

    let searched: Vec<Value> = server
        .client
        .get(server.url("/api/roms?search=chrono"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);

    let consoles: Vec<String> = server
        .client
        .get(server.url("/api/roms/consoles"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(consoles, vec!["megadrive", "snes"]);
}

#[tokio::test]
async fn test_rom_mutations_require_key() {
    let server = start_server(test_config()).await;
    let update = json!({ "description": "A classic", "tags": ["rpg", "square"] });

    let res = server
        .client
        .put(server.url("/api/roms/2"))
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .put(server.url("/api/roms/2"))
        .bearer_auth("wrong")
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .put(server.url("/api/roms/2"))
        .bearer_auth(API_KEY)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let game: Value = res.json().await.unwrap();
    assert_eq!(game["description"], "A classic");
    assert_eq!(game["tags"], json!(["rpg", "square"]));
    assert_eq!(game["title"], "Chrono Trigger");

    let res = server
        .client
        .put(server.url("/api/roms/2"))
        .bearer_auth(API_KEY)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .put(server.url("/api/roms/999"))
        .bearer_auth(API_KEY)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutations_without_configured_key() {
    let mut config = test_config();
    config.security.api_key = None;
    let server = start_server(config).await;

    let res = server
        .client
        .post(server.url("/api/roms/scan"))
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    // reads stay open
    let res = server.client.get(server.url("/api/roms/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_scrape_without_providers() {
    let server = start_server(test_config()).await;

    for path in ["/api/roms/1/scrape", "/api/roms/1/igdb"] {
        let res = server
            .client
            .post(server.url(path))
            .bearer_auth(API_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{path}");
    }
}

#[tokio::test]
async fn test_security_headers() {
    let mut config = test_config();
    config.security.enable_headers = true;
    let server = start_server(config).await;

    let res = server.client.get(server.url("/api/health")).send().await.unwrap();
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");
    assert_eq!(res.headers()["x-frame-options"], "SAMEORIGIN");
}

#[tokio::test]
async fn test_malformed_parameters_get_json_errors() {
    let server = start_server(test_config()).await;

    let res = server
        .client
        .get(server.url("/api/projects?language=en&language=gr"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("duplicate field"));

    let res = server
        .client
        .get(server.url("/api/blog/%FF"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());

    let res = server
        .client
        .delete(server.url("/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Method not allowed");
}
