//! ROM library subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/roms/scan
//!     → scanner.rs (walkdir over roms_dir, on the blocking pool)
//!     → RomStore upsert / mark_missing
//!
//! POST /api/roms/{id}/scrape | /igdb
//!     → MetadataSource (screenscraper.rs | igdb.rs, reqwest + retries)
//!     → media.rs (download images into media_dir, optional)
//!     → RomStore::update_game
//! ```

pub mod igdb;
pub mod media;
pub mod metadata;
pub mod scanner;
pub mod screenscraper;

use reqwest::Client;
use std::time::Duration;

use crate::config::{RomConfig, ScraperConfig};
use crate::models::{RomGame, RomUpdate};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::store::RomStore;

pub use igdb::Igdb;
pub use media::{ImageKind, MediaStore};
pub use metadata::{clean_title, MetadataSource, RemoteImage, ScrapeError, ScrapedMetadata};
pub use scanner::{scan, ScanError, ScanSummary};
pub use screenscraper::ScreenScraper;

/// Configured metadata providers. A provider without credentials is `None`.
pub struct Scrapers {
    pub screenscraper: Option<ScreenScraper>,
    pub igdb: Option<Igdb>,
    pub media: Option<MediaStore>,
}

impl Scrapers {
    pub fn from_config(roms: &RomConfig, config: &ScraperConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("portfolio-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let retry = RetryPolicy::from_config(config);

        let scrapers = Self {
            screenscraper: ScreenScraper::new(client.clone(), retry, &config.screenscraper),
            igdb: Igdb::new(client.clone(), retry, &config.igdb),
            media: roms
                .media_dir
                .clone()
                .map(|dir| MediaStore::new(dir, &roms.media_url_prefix, client, retry)),
        };

        tracing::info!(
            screenscraper = scrapers.screenscraper.is_some(),
            igdb = scrapers.igdb.is_some(),
            media_dir = ?roms.media_dir,
            "Metadata scrapers configured"
        );
        Ok(scrapers)
    }

    /// No providers and no media directory.
    pub fn disabled() -> Self {
        Self {
            screenscraper: None,
            igdb: None,
            media: None,
        }
    }

    pub fn screenscraper(&self) -> Result<&dyn MetadataSource, ScrapeError> {
        self.screenscraper
            .as_ref()
            .map(|s| s as &dyn MetadataSource)
            .ok_or(ScrapeError::NotConfigured("ScreenScraper"))
    }

    pub fn igdb(&self) -> Result<&dyn MetadataSource, ScrapeError> {
        self.igdb
            .as_ref()
            .map(|s| s as &dyn MetadataSource)
            .ok_or(ScrapeError::NotConfigured("IGDB"))
    }
}

/// Look up game `id` with `source` and persist the first match.
pub async fn scrape_game(
    source: &dyn MetadataSource,
    store: &dyn RomStore,
    media: Option<&MediaStore>,
    id: i32,
) -> Result<RomGame, ScrapeError> {
    let game = store.game(id).await?.ok_or(ScrapeError::GameNotFound)?;

    let metadata = match source.lookup(&game).await {
        Ok(Some(metadata)) => metadata,
        Ok(None) => {
            metrics::record_scrape(source.name(), "no_match");
            return Err(ScrapeError::NoMatch);
        }
        Err(e) => {
            metrics::record_scrape(source.name(), "error");
            return Err(e);
        }
    };
    metrics::record_scrape(source.name(), "matched");

    let update = build_update(&game, metadata, media).await;
    let updated = store
        .update_game(id, &update)
        .await?
        .ok_or(ScrapeError::GameNotFound)?;

    tracing::info!(
        game_id = id,
        source = source.name(),
        title = %updated.title,
        screenshots = updated.screenshots.len(),
        "Game metadata updated"
    );
    Ok(updated)
}

async fn build_update(
    game: &RomGame,
    metadata: ScrapedMetadata,
    media: Option<&MediaStore>,
) -> RomUpdate {
    let image_url = move |kind: ImageKind, image: RemoteImage| async move {
        match media {
            Some(media) => media.localize(&game.console, game.id, kind, &image).await,
            None => image.url,
        }
    };

    let box_art_url = match metadata.box_art {
        Some(image) => Some(image_url(ImageKind::BoxArt, image).await),
        None => None,
    };

    let mut screenshots = Vec::with_capacity(metadata.screenshots.len());
    for (index, image) in metadata.screenshots.into_iter().enumerate() {
        screenshots.push(image_url(ImageKind::Screenshot(index + 1), image).await);
    }

    RomUpdate {
        title: metadata.title,
        description: metadata.description,
        year: metadata.year,
        box_art_url,
        screenshots: (!screenshots.is_empty()).then_some(screenshots),
        tags: (!metadata.genres.is_empty()).then_some(metadata.genres),
        display_order: None,
    }
}
