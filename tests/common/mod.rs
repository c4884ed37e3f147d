//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use portfolio_api::config::{AppConfig, StoreBackend};
use portfolio_api::lifecycle::startup::build_state_with;
use portfolio_api::store::{MemoryStore, Stores};
use portfolio_api::{HttpServer, Shutdown};

pub const API_KEY: &str = "test-key";

/// A running server and the handle that stops it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Memory-store config with the API key set.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.store.backend = StoreBackend::Memory;
    config.security.api_key = Some(API_KEY.into());
    config.observability.metrics_enabled = false;
    config
}

/// Spawn the API on an ephemeral port over a freshly seeded memory store.
pub async fn start_server(config: AppConfig) -> TestServer {
    let store = Arc::new(MemoryStore::seeded().unwrap());
    let stores = Stores {
        content: store.clone(),
        roms: store,
    };
    start_server_with(config, stores).await
}

/// Spawn the API over caller-provided stores.
pub async fn start_server_with(config: AppConfig, stores: Stores) -> TestServer {
    let state = build_state_with(config, stores).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signalled = shutdown.signalled();

    tokio::spawn(async move {
        let _ = HttpServer::new(state).run(listener, signalled).await;
    });

    TestServer {
        addr,
        client: reqwest::Client::builder().no_proxy().build().unwrap(),
        shutdown,
    }
}

/// Reserve an ephemeral port for a mock upstream that needs to know its own URL.
pub async fn bind_upstream() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    (listener, url)
}

pub fn serve_upstream(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
}

/// Serve `router` on an ephemeral port and return its base URL.
pub async fn start_upstream(router: Router) -> String {
    let (listener, url) = bind_upstream().await;
    serve_upstream(listener, router);
    url
}
