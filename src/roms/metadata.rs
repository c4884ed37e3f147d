//! Provider-neutral scrape results and the source trait.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::RomGame;
use crate::store::StoreError;

/// Screenshots kept per game.
pub const MAX_SCREENSHOTS: usize = 4;

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\(\[][^\)\]]*[\)\]]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{0} credentials not configured")]
    NotConfigured(&'static str),

    #[error("Game not found")]
    GameNotFound,

    #[error("Console '{0}' is not supported by ScreenScraper")]
    UnsupportedConsole(String),

    #[error("No metadata match found")]
    NoMatch,

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected upstream response: {0}")]
    Decode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An image hosted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteImage {
    pub url: String,
    /// File extension reported by the provider, if any.
    pub format: Option<String>,
}

impl RemoteImage {
    pub fn new(url: impl Into<String>, format: Option<&str>) -> Self {
        Self {
            url: url.into(),
            format: format.map(|f| f.trim_start_matches('.').to_lowercase()),
        }
    }
}

/// What a provider knows about a game. Absent fields leave the row untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapedMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub genres: Vec<String>,
    pub box_art: Option<RemoteImage>,
    pub screenshots: Vec<RemoteImage>,
}

/// A metadata provider.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Metric and log label.
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the provider has no match for the game.
    async fn lookup(&self, game: &RomGame) -> Result<Option<ScrapedMetadata>, ScrapeError>;
}

/// Strip region/revision tags and separators from a ROM title:
/// `Super_Mario_World (USA) [!]` becomes `Super Mario World`.
pub fn clean_title(title: &str) -> String {
    let stripped = BRACKETED.replace_all(title, "");
    let spaced = stripped.replace('_', " ");
    WHITESPACE.replace_all(spaced.trim(), " ").into_owned()
}
