//! In-memory mock database.
//!
//! Serves the same queries as the postgres store from seeded tables, so the
//! site and the ROM library can run locally with no database. Selected with
//! `USE_MOCK_DB=true`.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::models::blog::sort_newest_first;
use crate::models::{
    BlogPost, BlogSummary, ContentEntry, GallerySummary, Paper, Photo, Project, RomFilter,
    RomGame, RomUpdate,
};
use crate::store::seed::Seed;
use crate::store::{ContentStore, RomStore, StoreResult};

#[derive(Default)]
struct Tables {
    content: Vec<ContentEntry>,
    projects: Vec<Project>,
    papers: Vec<Paper>,
    blog_posts: Vec<BlogPost>,
    photos: Vec<Photo>,
    rom_games: Vec<RomGame>,
    next_rom_id: i32,
}

impl From<Seed> for Tables {
    fn from(seed: Seed) -> Self {
        let next_rom_id = seed.rom_games.iter().map(|g| g.id).max().unwrap_or(0) + 1;
        Self {
            content: seed.content,
            projects: seed.projects,
            papers: seed.papers,
            blog_posts: seed.blog_posts,
            photos: seed.photos,
            rom_games: seed.rom_games,
            next_rom_id,
        }
    }
}

/// Store holding every table in process memory.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Empty tables.
    pub fn new() -> Self {
        Self::from_seed(Seed::default())
    }

    /// Tables filled with the embedded demo rows.
    pub fn seeded() -> StoreResult<Self> {
        Ok(Self::from_seed(Seed::load()?))
    }

    pub fn from_seed(seed: Seed) -> Self {
        Self {
            tables: RwLock::new(Tables::from(seed)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn content_entry(&self, language: &str, key: &str) -> StoreResult<Option<ContentEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .content
            .iter()
            .find(|c| c.language == language && c.key == key)
            .cloned())
    }

    async fn content_entries(&self, language: &str) -> StoreResult<Vec<ContentEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .content
            .iter()
            .filter(|c| c.language == language)
            .cloned()
            .collect())
    }

    async fn projects(&self, language: &str) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .iter()
            .filter(|p| p.language == language)
            .cloned()
            .collect();
        projects.sort_by_key(|p| p.display_order);
        Ok(projects)
    }

    async fn project(&self, id: i32, language: &str) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .find(|p| p.id == id && p.language == language)
            .cloned())
    }

    async fn papers(&self, language: &str) -> StoreResult<Vec<Paper>> {
        let tables = self.tables.read().await;
        let mut papers: Vec<Paper> = tables
            .papers
            .iter()
            .filter(|p| p.language == language)
            .cloned()
            .collect();
        papers.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(papers)
    }

    async fn paper(&self, id: i32, language: &str) -> StoreResult<Option<Paper>> {
        let tables = self.tables.read().await;
        Ok(tables
            .papers
            .iter()
            .find(|p| p.id == id && p.language == language)
            .cloned())
    }

    async fn blog_posts(&self, language: &str) -> StoreResult<Vec<BlogSummary>> {
        let tables = self.tables.read().await;
        let mut posts: Vec<BlogSummary> = tables
            .blog_posts
            .iter()
            .filter(|p| p.language == language)
            .map(BlogSummary::from)
            .collect();
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    async fn blog_post(&self, page_name: &str, language: &str) -> StoreResult<Option<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(tables
            .blog_posts
            .iter()
            .find(|p| p.page_name == page_name && p.language == language)
            .cloned())
    }

    async fn galleries(&self, language: &str) -> StoreResult<Vec<GallerySummary>> {
        let tables = self.tables.read().await;
        let mut photos: Vec<&Photo> = tables
            .photos
            .iter()
            .filter(|p| p.language == language)
            .collect();
        photos.sort_by_key(|p| p.display_order);

        // first photo of each gallery carries its metadata
        let mut galleries: BTreeMap<&str, GallerySummary> = BTreeMap::new();
        for photo in photos {
            galleries
                .entry(photo.gallery_name.as_str())
                .or_insert_with(|| GallerySummary::from(photo));
        }
        Ok(galleries.into_values().collect())
    }

    async fn gallery_photos(&self, gallery_name: &str, language: &str) -> StoreResult<Vec<Photo>> {
        let tables = self.tables.read().await;
        let mut photos: Vec<Photo> = tables
            .photos
            .iter()
            .filter(|p| p.gallery_name == gallery_name && p.language == language)
            .cloned()
            .collect();
        photos.sort_by_key(|p| p.display_order);
        Ok(photos)
    }

    async fn photo(&self, id: i32) -> StoreResult<Option<Photo>> {
        let tables = self.tables.read().await;
        Ok(tables.photos.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl RomStore for MemoryStore {
    async fn list_games(&self, filter: &RomFilter) -> StoreResult<Vec<RomGame>> {
        let tables = self.tables.read().await;
        let mut games: Vec<RomGame> = tables
            .rom_games
            .iter()
            .filter(|g| g.available && g.matches(filter))
            .cloned()
            .collect();
        games.sort_by(|a, b| {
            a.console
                .cmp(&b.console)
                .then(a.display_order.cmp(&b.display_order))
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(games)
    }

    async fn consoles(&self) -> StoreResult<Vec<String>> {
        let tables = self.tables.read().await;
        let mut consoles: Vec<String> = tables
            .rom_games
            .iter()
            .filter(|g| g.available)
            .map(|g| g.console.clone())
            .collect();
        consoles.sort();
        consoles.dedup();
        Ok(consoles)
    }

    async fn game(&self, id: i32) -> StoreResult<Option<RomGame>> {
        let tables = self.tables.read().await;
        Ok(tables.rom_games.iter().find(|g| g.id == id).cloned())
    }

    async fn update_game(&self, id: i32, update: &RomUpdate) -> StoreResult<Option<RomGame>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .rom_games
            .iter_mut()
            .find(|g| g.id == id)
            .map(|game| {
                game.apply(update);
                game.clone()
            }))
    }

    async fn upsert_discovered(
        &self,
        console: &str,
        filename: &str,
        title: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        if let Some(game) = tables
            .rom_games
            .iter_mut()
            .find(|g| g.console == console && g.filename == filename)
        {
            game.available = true;
            game.updated_at = Some(Utc::now());
            return Ok(false);
        }

        let id = tables.next_rom_id;
        tables.next_rom_id += 1;
        tables
            .rom_games
            .push(RomGame::discovered(id, filename, console, title));
        Ok(true)
    }

    async fn mark_missing(&self, console: &str, present: &[String]) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;

        for game in tables
            .rom_games
            .iter_mut()
            .filter(|g| g.console == console && g.available)
        {
            if !present.contains(&game.filename) {
                game.available = false;
                game.updated_at = Some(now);
                changed += 1;
            }
        }
        Ok(changed)
    }
}
