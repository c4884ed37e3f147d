//! Row types shared by every store and serialized straight into responses.
//!
//! Each type derives `sqlx::FromRow` for the postgres store and serde for the
//! memory/file stores and the JSON API. Array columns are `jsonb` in postgres
//! and decoded with `#[sqlx(json)]`.

pub mod blog;
pub mod content;
pub mod paper;
pub mod photo;
pub mod project;
pub mod rom;

pub use blog::{BlogPost, BlogSummary};
pub use content::ContentEntry;
pub use paper::Paper;
pub use photo::{GallerySummary, Photo};
pub use project::Project;
pub use rom::{RomFilter, RomGame, RomUpdate};

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";
