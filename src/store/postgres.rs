//! PostgreSQL store.
//!
//! # Responsibilities
//! - Own the connection pool (lazy: the server starts without a reachable database)
//! - Run parameterized queries, one statement per operation
//! - Record query latency and failures per table
//!
//! Schema lives in `migrations/` and is applied when `database.run_migrations` is set.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::DatabaseConfig;
use crate::models::{
    BlogPost, BlogSummary, ContentEntry, GallerySummary, Paper, Photo, Project, RomFilter,
    RomGame, RomUpdate,
};
use crate::observability::metrics;
use crate::store::{ContentStore, RomStore, StoreError, StoreResult};

const CONTENT_BY_KEY: &str =
    "SELECT id, language, key, value FROM content WHERE language = $1 AND key = $2";
const CONTENT_BY_LANGUAGE: &str =
    "SELECT id, language, key, value FROM content WHERE language = $1 ORDER BY key";

const PROJECTS_BY_LANGUAGE: &str =
    "SELECT * FROM projects WHERE language = $1 ORDER BY display_order";
const PROJECT_BY_ID: &str = "SELECT * FROM projects WHERE id = $1 AND language = $2";

const PAPERS_BY_LANGUAGE: &str = "SELECT * FROM papers WHERE language = $1 ORDER BY year DESC";
const PAPER_BY_ID: &str = "SELECT * FROM papers WHERE id = $1 AND language = $2";

const BLOG_POSTS_BY_LANGUAGE: &str = "SELECT id, page_name, title, created_at, updated_at \
     FROM blog_posts WHERE language = $1 ORDER BY updated_at DESC";
const BLOG_POST_BY_PAGE: &str = "SELECT * FROM blog_posts WHERE page_name = $1 AND language = $2";

const GALLERIES_BY_LANGUAGE: &str = "SELECT DISTINCT ON (gallery_name) \
     gallery_name, gallery_category, gallery_description, gallery_tags \
     FROM photos WHERE language = $1 ORDER BY gallery_name, display_order";
const PHOTOS_BY_GALLERY: &str =
    "SELECT * FROM photos WHERE gallery_name = $1 AND language = $2 ORDER BY display_order";
const PHOTO_BY_ID: &str = "SELECT * FROM photos WHERE id = $1";

const ROM_CONSOLES: &str =
    "SELECT DISTINCT console FROM rom_games WHERE available = true ORDER BY console ASC";
const ROM_BY_ID: &str = "SELECT * FROM rom_games WHERE id = $1";
const ROM_UPDATE: &str = "UPDATE rom_games SET \
     title = COALESCE($1, title), \
     description = COALESCE($2, description), \
     year = COALESCE($3, year), \
     box_art_url = COALESCE($4, box_art_url), \
     screenshots = COALESCE($5::jsonb, screenshots), \
     tags = COALESCE($6::jsonb, tags), \
     display_order = COALESCE($7, display_order), \
     updated_at = NOW() \
     WHERE id = $8 RETURNING *";
const ROM_UPSERT: &str = "INSERT INTO rom_games (filename, console, title, available) \
     VALUES ($1, $2, $3, true) \
     ON CONFLICT (filename, console) DO UPDATE SET available = true, updated_at = NOW() \
     RETURNING (xmax = 0) AS is_new";
const ROM_MARK_MISSING: &str = "UPDATE rom_games SET available = false, updated_at = NOW() \
     WHERE console = $1 AND available = true AND NOT (filename = ANY($2))";

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create the pool and, if configured, apply migrations.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect_lazy_with(options);

        if config.run_migrations {
            tracing::info!("Applying database migrations");
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Time a query and count its failures.
async fn observe<T, F>(operation: &'static str, table: &'static str, query: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;
    metrics::record_db_query(operation, table, start);

    result.map_err(|e| {
        metrics::record_db_error(operation, table, error_kind(&e));
        StoreError::Database(e)
    })
}

fn error_kind(error: &sqlx::Error) -> &'static str {
    match error {
        sqlx::Error::Database(_) => "database",
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => "pool",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "connection",
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => "decode",
        _ => "other",
    }
}

/// `SELECT` for the ROM listing with one bind per active filter.
pub fn list_games_query(filter: &RomFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT * FROM rom_games WHERE available = true");

    if let Some(console) = &filter.console {
        query.push(" AND console = ").push_bind(console.clone());
    }
    if let Some(search) = &filter.search {
        query.push(" AND title ILIKE ").push_bind(format!("%{search}%"));
    }
    for tag in &filter.tags {
        query
            .push(" AND tags @> ")
            .push_bind(Json(vec![tag.clone()]));
    }

    query.push(" ORDER BY console ASC, display_order ASC, title ASC");
    query
}

#[async_trait]
impl ContentStore for PgStore {
    async fn content_entry(&self, language: &str, key: &str) -> StoreResult<Option<ContentEntry>> {
        observe(
            "select",
            "content",
            sqlx::query_as(CONTENT_BY_KEY)
                .bind(language)
                .bind(key)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn content_entries(&self, language: &str) -> StoreResult<Vec<ContentEntry>> {
        observe(
            "select",
            "content",
            sqlx::query_as(CONTENT_BY_LANGUAGE)
                .bind(language)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn projects(&self, language: &str) -> StoreResult<Vec<Project>> {
        observe(
            "select",
            "projects",
            sqlx::query_as(PROJECTS_BY_LANGUAGE)
                .bind(language)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn project(&self, id: i32, language: &str) -> StoreResult<Option<Project>> {
        observe(
            "select",
            "projects",
            sqlx::query_as(PROJECT_BY_ID)
                .bind(id)
                .bind(language)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn papers(&self, language: &str) -> StoreResult<Vec<Paper>> {
        observe(
            "select",
            "papers",
            sqlx::query_as(PAPERS_BY_LANGUAGE)
                .bind(language)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn paper(&self, id: i32, language: &str) -> StoreResult<Option<Paper>> {
        observe(
            "select",
            "papers",
            sqlx::query_as(PAPER_BY_ID)
                .bind(id)
                .bind(language)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn blog_posts(&self, language: &str) -> StoreResult<Vec<BlogSummary>> {
        observe(
            "select",
            "blog_posts",
            sqlx::query_as(BLOG_POSTS_BY_LANGUAGE)
                .bind(language)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn blog_post(&self, page_name: &str, language: &str) -> StoreResult<Option<BlogPost>> {
        observe(
            "select",
            "blog_posts",
            sqlx::query_as(BLOG_POST_BY_PAGE)
                .bind(page_name)
                .bind(language)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn galleries(&self, language: &str) -> StoreResult<Vec<GallerySummary>> {
        observe(
            "select",
            "photos",
            sqlx::query_as(GALLERIES_BY_LANGUAGE)
                .bind(language)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn gallery_photos(&self, gallery_name: &str, language: &str) -> StoreResult<Vec<Photo>> {
        observe(
            "select",
            "photos",
            sqlx::query_as(PHOTOS_BY_GALLERY)
                .bind(gallery_name)
                .bind(language)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn photo(&self, id: i32) -> StoreResult<Option<Photo>> {
        observe(
            "select",
            "photos",
            sqlx::query_as(PHOTO_BY_ID).bind(id).fetch_optional(&self.pool),
        )
        .await
    }
}

#[async_trait]
impl RomStore for PgStore {
    async fn list_games(&self, filter: &RomFilter) -> StoreResult<Vec<RomGame>> {
        let mut query = list_games_query(filter);
        observe(
            "select",
            "rom_games",
            query.build_query_as::<RomGame>().fetch_all(&self.pool),
        )
        .await
    }

    async fn consoles(&self) -> StoreResult<Vec<String>> {
        observe(
            "select",
            "rom_games",
            sqlx::query_scalar(ROM_CONSOLES).fetch_all(&self.pool),
        )
        .await
    }

    async fn game(&self, id: i32) -> StoreResult<Option<RomGame>> {
        observe(
            "select",
            "rom_games",
            sqlx::query_as(ROM_BY_ID).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_game(&self, id: i32, update: &RomUpdate) -> StoreResult<Option<RomGame>> {
        observe(
            "update",
            "rom_games",
            sqlx::query_as(ROM_UPDATE)
                .bind(update.title.clone())
                .bind(update.description.clone())
                .bind(update.year)
                .bind(update.box_art_url.clone())
                .bind(update.screenshots.clone().map(Json))
                .bind(update.tags.clone().map(Json))
                .bind(update.display_order)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn upsert_discovered(
        &self,
        console: &str,
        filename: &str,
        title: &str,
    ) -> StoreResult<bool> {
        observe(
            "upsert",
            "rom_games",
            sqlx::query_scalar(ROM_UPSERT)
                .bind(filename)
                .bind(console)
                .bind(title)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn mark_missing(&self, console: &str, present: &[String]) -> StoreResult<u64> {
        let result = observe(
            "update",
            "rom_games",
            sqlx::query(ROM_MARK_MISSING)
                .bind(console)
                .bind(present.to_vec())
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
