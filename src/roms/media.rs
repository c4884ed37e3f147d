//! Downloads scraped images into the media directory.

use reqwest::Client;
use std::path::PathBuf;

use crate::resilience::RetryPolicy;
use crate::roms::metadata::RemoteImage;
use crate::store::files::is_safe_segment;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const DEFAULT_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    BoxArt,
    /// 1-based screenshot index.
    Screenshot(usize),
}

impl ImageKind {
    fn file_name(self, game_id: i32, extension: &str) -> String {
        match self {
            ImageKind::BoxArt => format!("{game_id}-box.{extension}"),
            ImageKind::Screenshot(n) => format!("{game_id}-ss{n}.{extension}"),
        }
    }
}

pub struct MediaStore {
    dir: PathBuf,
    url_prefix: String,
    client: Client,
    retry: RetryPolicy,
}

impl MediaStore {
    pub fn new(dir: PathBuf, url_prefix: &str, client: Client, retry: RetryPolicy) -> Self {
        Self {
            dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            client,
            retry,
        }
    }

    /// Store `image` locally and return its public URL. Any failure falls back
    /// to the remote URL.
    pub async fn localize(
        &self,
        console: &str,
        game_id: i32,
        kind: ImageKind,
        image: &RemoteImage,
    ) -> String {
        match self.download(console, game_id, kind, image).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    game_id,
                    url = %image.url,
                    error = %e,
                    "Image download failed, keeping remote URL"
                );
                image.url.clone()
            }
        }
    }

    async fn download(
        &self,
        console: &str,
        game_id: i32,
        kind: ImageKind,
        image: &RemoteImage,
    ) -> Result<String, MediaError> {
        if !is_safe_segment(console) {
            return Err(MediaError::UnsafeConsole(console.to_string()));
        }

        let response = self.retry.send(|| self.client.get(&image.url)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }

        let extension = image_extension(image, content_type.as_deref());
        let file_name = kind.file_name(game_id, extension);
        let console_dir = self.dir.join(console);
        tokio::fs::create_dir_all(&console_dir).await?;
        tokio::fs::write(console_dir.join(&file_name), &bytes).await?;

        tracing::debug!(game_id, file = %file_name, bytes = bytes.len(), "Stored image");
        Ok(format!("{}/{console}/{file_name}", self.url_prefix))
    }
}

#[derive(Debug, thiserror::Error)]
enum MediaError {
    #[error("console name '{0}' is not a safe directory name")]
    UnsafeConsole(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(u16),

    #[error("empty body")]
    Empty,

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Provider format, then URL suffix, then Content-Type, then `jpg`.
fn image_extension<'a>(image: &'a RemoteImage, content_type: Option<&str>) -> &'a str {
    let known = |ext: &str| IMAGE_EXTENSIONS.iter().find(|e| e.eq_ignore_ascii_case(ext)).copied();

    if let Some(ext) = image.format.as_deref().and_then(known) {
        return ext;
    }

    let from_url = url::Url::parse(&image.url).ok().and_then(|u| {
        let path = u.path();
        path.rsplit_once('.')
            .and_then(|(_, ext)| known(ext))
    });
    if let Some(ext) = from_url {
        return ext;
    }

    match content_type.map(|c| c.split(';').next().unwrap_or_default().trim()) {
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        _ => DEFAULT_EXTENSION,
    }
}
