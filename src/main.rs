//! Portfolio content API
//!
//! Serves the site's language-partitioned content (page text, projects,
//! papers, blog posts, photo galleries) and a ROM library with metadata
//! scraping.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ tower-http layers ──▶ api handlers ──▶ ContentStore / RomStore
//!                     (trace, request id,        │              ├─ postgres (sqlx)
//!                      timeout, limits,          │              ├─ memory (seeded)
//!                      CORS, metrics)            │              └─ files (JSON + Markdown)
//!                                                │
//!                                                └──▶ roms: scanner, ScreenScraper, IGDB
//!
//!     Cross-cutting: config, observability, resilience, lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use portfolio_api::config::load_config;
use portfolio_api::lifecycle::{build_state, signals::spawn_signal_listener, Shutdown};
use portfolio_api::observability::logging;
use portfolio_api::HttpServer;

#[derive(Parser)]
#[command(name = "portfolio-api")]
#[command(about = "Content API for the portfolio site", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PORTFOLIO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("portfolio-api: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        store = ?config.store.backend,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address.clone();
    let state = build_state(config).await?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    HttpServer::new(state)
        .run(listener, shutdown.signalled())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
