//! Content storage subsystem.
//!
//! # Data Flow
//! ```text
//! handler (api::*)
//!     → ContentStore / RomStore trait object
//!         → postgres.rs (sqlx pool, parameterized SQL)
//!         → memory.rs   (seeded in-process tables, mock database)
//!         → files.rs    (JSON + Markdown content directory)
//!     → Option<T> for single lookups (None → 404), Vec<T> for listings
//! ```
//!
//! # Design Decisions
//! - Every backend returns rows already filtered and sorted, so handlers stay thin
//! - "Not found" is `Ok(None)`; `StoreError` is reserved for real failures
//! - The files backend is read-only for ROMs and pairs with a memory ROM table

pub mod files;
pub mod gallery;
pub mod memory;
pub mod postgres;
pub mod seed;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{AppConfig, StoreBackend};
use crate::models::{
    BlogPost, BlogSummary, ContentEntry, GallerySummary, Paper, Photo, Project, RomFilter,
    RomGame, RomUpdate,
};

pub use files::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur while reading or writing content.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed front matter in {path}: {message}")]
    FrontMatter { path: String, message: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the site's language-partitioned content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn content_entry(&self, language: &str, key: &str) -> StoreResult<Option<ContentEntry>>;

    async fn content_entries(&self, language: &str) -> StoreResult<Vec<ContentEntry>>;

    /// Ordered by `display_order` ascending.
    async fn projects(&self, language: &str) -> StoreResult<Vec<Project>>;

    async fn project(&self, id: i32, language: &str) -> StoreResult<Option<Project>>;

    /// Ordered by `year` descending.
    async fn papers(&self, language: &str) -> StoreResult<Vec<Paper>>;

    async fn paper(&self, id: i32, language: &str) -> StoreResult<Option<Paper>>;

    /// Ordered by `updated_at` descending.
    async fn blog_posts(&self, language: &str) -> StoreResult<Vec<BlogSummary>>;

    async fn blog_post(&self, page_name: &str, language: &str) -> StoreResult<Option<BlogPost>>;

    /// One entry per gallery, ordered by name.
    async fn galleries(&self, language: &str) -> StoreResult<Vec<GallerySummary>>;

    /// Ordered by `display_order` ascending.
    async fn gallery_photos(&self, gallery_name: &str, language: &str) -> StoreResult<Vec<Photo>>;

    /// Looked up across languages.
    async fn photo(&self, id: i32) -> StoreResult<Option<Photo>>;
}

/// The ROM catalog.
#[async_trait]
pub trait RomStore: Send + Sync {
    /// Available games passing `filter`, ordered by console, display order, title.
    async fn list_games(&self, filter: &RomFilter) -> StoreResult<Vec<RomGame>>;

    /// Distinct consoles with at least one available game, sorted.
    async fn consoles(&self) -> StoreResult<Vec<String>>;

    async fn game(&self, id: i32) -> StoreResult<Option<RomGame>>;

    async fn update_game(&self, id: i32, update: &RomUpdate) -> StoreResult<Option<RomGame>>;

    /// Insert or re-enable `(filename, console)`. Returns `true` when the row is new.
    async fn upsert_discovered(&self, console: &str, filename: &str, title: &str)
        -> StoreResult<bool>;

    /// Flag available rows of `console` whose filename is not in `present`.
    /// Returns the number of rows changed.
    async fn mark_missing(&self, console: &str, present: &[String]) -> StoreResult<u64>;
}

/// The pair of stores handlers work against.
#[derive(Clone)]
pub struct Stores {
    pub content: Arc<dyn ContentStore>,
    pub roms: Arc<dyn RomStore>,
}

impl Stores {
    /// Build the stores selected by `config.store.backend`.
    pub async fn from_config(config: &AppConfig) -> StoreResult<Self> {
        match config.store.backend {
            StoreBackend::Postgres => {
                let store = Arc::new(PgStore::connect(&config.database).await?);
                tracing::info!(
                    host = %config.database.host,
                    database = %config.database.name,
                    "Using PostgreSQL store"
                );
                Ok(Self {
                    content: store.clone(),
                    roms: store,
                })
            }
            StoreBackend::Memory => {
                tracing::info!("Using in-memory mock store, no database connection required");
                let store = Arc::new(MemoryStore::seeded()?);
                Ok(Self {
                    content: store.clone(),
                    roms: store,
                })
            }
            StoreBackend::Files => {
                tracing::info!(
                    content_dir = %config.store.content_dir.display(),
                    "Using content directory store"
                );
                Ok(Self {
                    content: Arc::new(FileStore::new(&config.store.content_dir)),
                    roms: Arc::new(MemoryStore::new()),
                })
            }
        }
    }
}
