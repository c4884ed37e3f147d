//! Demo rows for the in-memory store, embedded at compile time.

use serde::de::DeserializeOwned;

use crate::models::{BlogPost, ContentEntry, Paper, Photo, Project, RomGame};
use crate::store::{StoreError, StoreResult};

const CONTENT: &str = include_str!("seed/content.json");
const PROJECTS: &str = include_str!("seed/projects.json");
const PAPERS: &str = include_str!("seed/papers.json");
const BLOG_POSTS: &str = include_str!("seed/blog_posts.json");
const PHOTOS: &str = include_str!("seed/photos.json");
const ROM_GAMES: &str = include_str!("seed/rom_games.json");

#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub content: Vec<ContentEntry>,
    pub projects: Vec<Project>,
    pub papers: Vec<Paper>,
    pub blog_posts: Vec<BlogPost>,
    pub photos: Vec<Photo>,
    pub rom_games: Vec<RomGame>,
}

impl Seed {
    pub fn load() -> StoreResult<Self> {
        Ok(Self {
            content: parse("seed/content.json", CONTENT)?,
            projects: parse("seed/projects.json", PROJECTS)?,
            papers: parse("seed/papers.json", PAPERS)?,
            blog_posts: parse("seed/blog_posts.json", BLOG_POSTS)?,
            photos: parse("seed/photos.json", PHOTOS)?,
            rom_games: parse("seed/rom_games.json", ROM_GAMES)?,
        })
    }
}

fn parse<T: DeserializeOwned>(path: &str, raw: &str) -> StoreResult<Vec<T>> {
    serde_json::from_str(raw).map_err(|source| StoreError::Json {
        path: path.to_string(),
        source,
    })
}
