//! ScreenScraper (`jeuInfos.php`) client.
//!
//! A game is looked up by ROM name within the console's system. The file
//! name is tried first, then the cleaned title; the first hit wins.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::ScreenScraperConfig;
use crate::models::RomGame;
use crate::resilience::RetryPolicy;
use crate::roms::metadata::{
    clean_title, MetadataSource, RemoteImage, ScrapeError, ScrapedMetadata, MAX_SCREENSHOTS,
};

/// Region preference for names, dates and media.
const REGIONS: &[&str] = &["ss", "us", "wor", "eu", "uk", "jp"];

/// ScreenScraper system id for a console directory name.
pub fn system_id(console: &str) -> Option<u32> {
    let key: String = console
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();

    let id = match key.as_str() {
        "megadrive" | "genesis" | "md" => 1,
        "mastersystem" | "sms" => 2,
        "nes" | "famicom" => 3,
        "snes" | "superfamicom" | "sfc" => 4,
        "gb" | "gameboy" => 9,
        "gbc" | "gameboycolor" => 10,
        "gba" | "gameboyadvance" => 12,
        "gamecube" | "gc" | "ngc" => 13,
        "n64" | "nintendo64" => 14,
        "nds" | "ds" => 15,
        "wii" => 16,
        "32x" | "sega32x" => 19,
        "segacd" | "megacd" => 20,
        "gamegear" | "gg" => 21,
        "saturn" => 22,
        "dreamcast" | "dc" => 23,
        "atari2600" => 26,
        "lynx" => 28,
        "pcengine" | "tg16" | "turbografx16" | "pce" => 31,
        "xbox" => 32,
        "psx" | "ps1" | "playstation" => 57,
        "ps2" | "playstation2" => 58,
        "psp" => 61,
        "amiga" => 64,
        "c64" | "commodore64" => 66,
        "arcade" | "mame" | "fbneo" => 75,
        "neogeo" => 142,
        _ => return None,
    };
    Some(id)
}

pub struct ScreenScraper {
    client: Client,
    retry: RetryPolicy,
    config: ScreenScraperConfig,
    dev_id: String,
    dev_password: String,
}

impl ScreenScraper {
    /// `None` without developer credentials.
    pub fn new(client: Client, retry: RetryPolicy, config: &ScreenScraperConfig) -> Option<Self> {
        let dev_id = config.dev_id.clone().filter(|s| !s.is_empty())?;
        let dev_password = config.dev_password.clone().filter(|s| !s.is_empty())?;
        Some(Self {
            client,
            retry,
            config: config.clone(),
            dev_id,
            dev_password,
        })
    }

    async fn fetch(&self, system: u32, rom_name: &str) -> Result<Option<Jeu>, ScrapeError> {
        let url = format!("{}/jeuInfos.php", self.config.base_url.trim_end_matches('/'));
        let system = system.to_string();

        let mut params: Vec<(&str, &str)> = vec![
            ("devid", self.dev_id.as_str()),
            ("devpassword", self.dev_password.as_str()),
            ("softname", self.config.softname.as_str()),
            ("output", "json"),
            ("systemeid", system.as_str()),
            ("romnom", rom_name),
        ];
        if let (Some(user), Some(password)) = (&self.config.username, &self.config.password) {
            params.push(("ssid", user.as_str()));
            params.push(("sspassword", password.as_str()));
        }

        let response = self
            .retry
            .send(|| self.client.get(&url).query(&params))
            .await?;

        match response.status() {
            // unknown rom
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(ScrapeError::Upstream {
                    status: status.as_u16(),
                    message: message.chars().take(200).collect(),
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        parse_response(&body).map(Some)
    }
}

#[async_trait]
impl MetadataSource for ScreenScraper {
    fn name(&self) -> &'static str {
        "screenscraper"
    }

    async fn lookup(&self, game: &RomGame) -> Result<Option<ScrapedMetadata>, ScrapeError> {
        let system = system_id(&game.console)
            .ok_or_else(|| ScrapeError::UnsupportedConsole(game.console.clone()))?;

        let mut candidates = vec![game.filename.clone()];
        let cleaned = clean_title(&game.title);
        if !cleaned.is_empty() && cleaned != game.filename {
            candidates.push(cleaned);
        }

        for candidate in &candidates {
            tracing::debug!(game_id = game.id, system, candidate = %candidate, "Querying ScreenScraper");
            if let Some(jeu) = self.fetch(system, candidate).await? {
                return Ok(Some(jeu.into_metadata()));
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Inner,
}

#[derive(Debug, Deserialize)]
struct Inner {
    jeu: Jeu,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Jeu {
    noms: Vec<Localized>,
    synopsis: Vec<Localized>,
    dates: Vec<Localized>,
    genres: Vec<Genre>,
    medias: Vec<Media>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Localized {
    region: Option<String>,
    langue: Option<String>,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Genre {
    noms: Vec<Localized>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Media {
    #[serde(rename = "type")]
    kind: String,
    region: Option<String>,
    url: String,
    format: Option<String>,
}

fn region_rank(region: Option<&str>) -> usize {
    region
        .and_then(|r| REGIONS.iter().position(|p| *p == r))
        .unwrap_or(REGIONS.len())
}

fn by_region(items: &[Localized]) -> Option<&Localized> {
    items
        .iter()
        .filter(|i| !i.text.is_empty())
        .min_by_key(|i| region_rank(i.region.as_deref()))
}

fn english(items: &[Localized]) -> Option<&Localized> {
    items
        .iter()
        .find(|i| i.langue.as_deref() == Some("en"))
        .or_else(|| items.first())
        .filter(|i| !i.text.is_empty())
}

impl Jeu {
    pub(crate) fn into_metadata(self) -> ScrapedMetadata {
        let year = self
            .dates
            .iter()
            .filter_map(|d| d.text.get(..4)?.parse::<i32>().ok().map(|y| (d, y)))
            .min_by_key(|(d, _)| region_rank(d.region.as_deref()))
            .map(|(_, y)| y);

        let genres = self
            .genres
            .iter()
            .filter_map(|g| english(&g.noms))
            .map(|n| n.text.clone())
            .collect();

        let box_art = self
            .medias
            .iter()
            .filter(|m| m.kind == "box-2D" && !m.url.is_empty())
            .min_by_key(|m| region_rank(m.region.as_deref()))
            .map(|m| RemoteImage::new(&m.url, m.format.as_deref()));

        let screenshots = self
            .medias
            .iter()
            .filter(|m| m.kind == "ss" && !m.url.is_empty())
            .take(MAX_SCREENSHOTS)
            .map(|m| RemoteImage::new(&m.url, m.format.as_deref()))
            .collect();

        ScrapedMetadata {
            title: by_region(&self.noms).map(|n| n.text.clone()),
            description: english(&self.synopsis).map(|s| s.text.clone()),
            year,
            genres,
            box_art,
            screenshots,
        }
    }
}

pub(crate) fn parse_response(body: &str) -> Result<Jeu, ScrapeError> {
    serde_json::from_str::<Envelope>(body)
        .map(|e| e.response.jeu)
        .map_err(|e| ScrapeError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "header": {"success": "true"},
        "response": {
            "jeu": {
                "id": "3195",
                "noms": [
                    {"region": "jp", "text": "Super Mario World: Super Mario Bros. 4"},
                    {"region": "ss", "text": "Super Mario World"}
                ],
                "synopsis": [
                    {"langue": "fr", "text": "Mario part..."},
                    {"langue": "en", "text": "Mario sets out..."}
                ],
                "dates": [
                    {"region": "jp", "text": "1990-11-21"},
                    {"region": "us", "text": "1991-08-13"}
                ],
                "genres": [
                    {"id": "7", "noms": [{"langue": "de", "text": "Plattform"}, {"langue": "en", "text": "Platform"}]}
                ],
                "medias": [
                    {"type": "box-2D", "region": "jp", "url": "https://ss/jp-box", "format": "png"},
                    {"type": "box-2D", "region": "us", "url": "https://ss/us-box", "format": "png"},
                    {"type": "ss", "region": "wor", "url": "https://ss/ss1", "format": "png"},
                    {"type": "ss", "region": "us", "url": "https://ss/ss2", "format": "jpg"},
                    {"type": "wheel", "region": "wor", "url": "https://ss/wheel", "format": "png"}
                ]
            }
        }
    }"#;

    #[test]
    fn test_system_ids() {
        assert_eq!(system_id("snes"), Some(4));
        assert_eq!(system_id("Mega Drive"), Some(1));
        assert_eq!(system_id("PS1"), Some(57));
        assert_eq!(system_id("vectrex-homebrew"), None);
    }

    #[test]
    fn test_parse_prefers_regions_and_english() {
        let metadata = parse_response(SAMPLE).unwrap().into_metadata();

        assert_eq!(metadata.title.as_deref(), Some("Super Mario World"));
        assert_eq!(metadata.description.as_deref(), Some("Mario sets out..."));
        assert_eq!(metadata.year, Some(1991));
        assert_eq!(metadata.genres, vec!["Platform".to_string()]);
        assert_eq!(
            metadata.box_art,
            Some(RemoteImage::new("https://ss/us-box", Some("png")))
        );
        assert_eq!(metadata.screenshots.len(), 2);
        assert_eq!(metadata.screenshots[1].format.as_deref(), Some("jpg"));
    }

    #[test]
    fn test_parse_rejects_unexpected_body() {
        assert!(matches!(
            parse_response("Erreur : Rom/Iso/Dossier non trouvée !"),
            Err(ScrapeError::Decode(_))
        ));
    }

    #[test]
    fn test_unconfigured_client() {
        let config = ScreenScraperConfig::default();
        assert!(ScreenScraper::new(Client::new(), RetryPolicy::default(), &config).is_none());
    }
}
