//! IGDB client, authenticated with a Twitch client-credentials token.

use async_trait::async_trait;
use chrono::{DateTime, Datelike};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::IgdbConfig;
use crate::models::RomGame;
use crate::resilience::RetryPolicy;
use crate::roms::metadata::{
    clean_title, MetadataSource, RemoteImage, ScrapeError, ScrapedMetadata, MAX_SCREENSHOTS,
};

/// Tokens are refreshed this long before Twitch says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const GAME_FIELDS: &str =
    "name,summary,first_release_date,genres.name,cover.image_id,screenshots.image_id";

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

pub struct Igdb {
    client: Client,
    retry: RetryPolicy,
    config: IgdbConfig,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl Igdb {
    /// `None` without Twitch credentials.
    pub fn new(client: Client, retry: RetryPolicy, config: &IgdbConfig) -> Option<Self> {
        let client_id = config.client_id.clone().filter(|s| !s.is_empty())?;
        let client_secret = config.client_secret.clone().filter(|s| !s.is_empty())?;
        Some(Self {
            client,
            retry,
            config: config.clone(),
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Cached token, or a fresh one from Twitch.
    async fn access_token(&self) -> Result<String, ScrapeError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];
        let response = self
            .retry
            .send(|| self.client.post(&self.config.token_url).query(&params))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Upstream {
                status: status.as_u16(),
                message: "Twitch token request rejected".to_string(),
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ScrapeError::Decode(e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        tracing::debug!(expires_in = token.expires_in, "Obtained Twitch access token");
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    /// Search by title. A 401 drops the cached token and retries once with a
    /// fresh one.
    async fn search(&self, title: &str) -> Result<Option<IgdbGame>, ScrapeError> {
        let url = format!("{}/games", self.config.base_url.trim_end_matches('/'));
        let body = search_query(title);

        let mut response = self.send_search(&url, &body).await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::debug!("IGDB rejected the cached token, refreshing");
            self.token.lock().await.take();
            response = self.send_search(&url, &body).await?;
        }

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.token.lock().await.take();
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Upstream {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let games: Vec<IgdbGame> = response
            .json()
            .await
            .map_err(|e| ScrapeError::Decode(e.to_string()))?;
        Ok(games.into_iter().next())
    }

    async fn send_search(&self, url: &str, body: &str) -> Result<reqwest::Response, ScrapeError> {
        let token = self.access_token().await?;
        let response = self
            .retry
            .send(|| {
                self.client
                    .post(url)
                    .header("Client-ID", &self.client_id)
                    .bearer_auth(&token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .body(body.to_string())
            })
            .await?;
        Ok(response)
    }

    fn image_url(&self, size: &str, image_id: &str) -> RemoteImage {
        RemoteImage::new(
            format!(
                "{}/{size}/{image_id}.jpg",
                self.config.image_base_url.trim_end_matches('/')
            ),
            Some("jpg"),
        )
    }

    fn metadata_from(&self, game: IgdbGame) -> ScrapedMetadata {
        ScrapedMetadata {
            title: game.name.filter(|n| !n.is_empty()),
            description: game.summary.filter(|s| !s.is_empty()),
            year: game.first_release_date.and_then(release_year),
            genres: game.genres.into_iter().map(|g| g.name).collect(),
            box_art: game.cover.map(|c| self.image_url("t_cover_big", &c.image_id)),
            screenshots: game
                .screenshots
                .iter()
                .take(MAX_SCREENSHOTS)
                .map(|s| self.image_url("t_screenshot_big", &s.image_id))
                .collect(),
        }
    }
}

#[async_trait]
impl MetadataSource for Igdb {
    fn name(&self) -> &'static str {
        "igdb"
    }

    async fn lookup(&self, game: &RomGame) -> Result<Option<ScrapedMetadata>, ScrapeError> {
        let title = clean_title(&game.title);
        if title.is_empty() {
            return Ok(None);
        }
        tracing::debug!(game_id = game.id, title = %title, "Querying IGDB");
        Ok(self.search(&title).await?.map(|g| self.metadata_from(g)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IgdbGame {
    name: Option<String>,
    summary: Option<String>,
    first_release_date: Option<i64>,
    genres: Vec<NamedRef>,
    cover: Option<ImageRef>,
    screenshots: Vec<ImageRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NamedRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageRef {
    image_id: String,
}

/// Apicalypse body searching by title.
pub fn search_query(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!("search \"{escaped}\"; fields {GAME_FIELDS}; limit 1;")
}

fn release_year(timestamp: i64) -> Option<i32> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.year())
}
