use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A cataloged ROM, unique per `(filename, console)`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct RomGame {
    pub id: i32,
    /// File name on disk, or the game directory name for per-game layouts.
    pub filename: String,
    /// Name of the console directory the ROM was found in.
    pub console: String,
    pub title: String,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub box_art_url: Option<String>,
    #[sqlx(json)]
    pub screenshots: Vec<String>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub display_order: i32,
    /// Cleared by a scan that no longer finds the file.
    pub available: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RomGame {
    /// A freshly discovered, available game with no metadata.
    pub fn discovered(id: i32, filename: &str, console: &str, title: &str) -> Self {
        let now = Utc::now();
        Self {
            id,
            filename: filename.to_string(),
            console: console.to_string(),
            title: title.to_string(),
            description: None,
            year: None,
            box_art_url: None,
            screenshots: Vec::new(),
            tags: Vec::new(),
            display_order: 0,
            available: true,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Whether the game passes `filter`, ignoring availability.
    pub fn matches(&self, filter: &RomFilter) -> bool {
        if let Some(console) = &filter.console {
            if &self.console != console {
                return false;
            }
        }
        if let Some(search) = &filter.search {
            if !self.title.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        filter.tags.iter().all(|tag| self.tags.contains(tag))
    }

    /// Overwrite every field `update` carries.
    pub fn apply(&mut self, update: &RomUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(year) = update.year {
            self.year = Some(year);
        }
        if let Some(url) = &update.box_art_url {
            self.box_art_url = Some(url.clone());
        }
        if let Some(screenshots) = &update.screenshots {
            self.screenshots = screenshots.clone();
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if let Some(order) = update.display_order {
            self.display_order = order;
        }
        self.updated_at = Some(Utc::now());
    }
}

/// Listing filters for `GET /api/roms`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomFilter {
    pub console: Option<String>,
    /// Case-insensitive title substring.
    pub search: Option<String>,
    /// Every tag must be present.
    pub tags: Vec<String>,
}

impl RomFilter {
    /// Parse a raw query string. `tags` may repeat; empty values are ignored.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut filter = Self::default();
        let Some(query) = query else {
            return filter;
        };

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "console" => filter.console = Some(value.into_owned()),
                "search" => filter.search = Some(value.into_owned()),
                "tags" | "tags[]" => filter.tags.push(value.into_owned()),
                _ => {}
            }
        }
        filter
    }
}

/// Partial update body for `PUT /api/roms/{id}`. Absent fields are left as is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RomUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub box_art_url: Option<String>,
    pub screenshots: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub display_order: Option<i32>,
}
