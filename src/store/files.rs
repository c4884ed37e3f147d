//! Read-only store over a content directory.
//!
//! ```text
//! {content_dir}/{lang}/content.json         {"key": "value", ...}
//! {content_dir}/{lang}/projects.json        [Project, ...]
//! {content_dir}/{lang}/papers.json          [Paper, ...]
//! {content_dir}/{lang}/blog/{page}.md       YAML front matter + markdown body
//! {content_dir}/{lang}/galleries/{name}.json GalleryFile
//! ```
//!
//! Files are read on every request. A missing file reads as an empty table.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::models::blog::sort_newest_first;
use crate::models::{
    BlogPost, BlogSummary, ContentEntry, GallerySummary, Paper, Photo, Project,
};
use crate::store::gallery::GalleryFile;
use crate::store::{ContentStore, StoreError, StoreResult};

const FRONT_MATTER_DELIMITER: &str = "---";

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `{root}/{language}/{parts..}`, or `None` if any segment could escape the root.
    fn path(&self, language: &str, parts: &[&str]) -> Option<PathBuf> {
        if !is_safe_segment(language) || !parts.iter().all(|p| is_safe_segment(p)) {
            return None;
        }
        let mut path = self.root.join(language);
        path.extend(parts);
        Some(path)
    }

    async fn read_json<T: DeserializeOwned + Default>(&self, path: &Path) -> StoreResult<T> {
        let Some(raw) = read_optional(path).await? else {
            return Ok(T::default());
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    async fn read_gallery(&self, path: &Path) -> StoreResult<Option<GalleryFile>> {
        let Some(raw) = read_optional(path).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Json {
                path: path.display().to_string(),
                source,
            })
    }

    /// Gallery files of one language as `(stem, file)`, sorted by stem.
    async fn gallery_files(&self, language: &str) -> StoreResult<Vec<(String, GalleryFile)>> {
        let Some(dir) = self.path(language, &["galleries"]) else {
            return Ok(Vec::new());
        };
        let mut galleries = Vec::new();
        for (stem, path) in list_files(&dir, "json").await? {
            if let Some(gallery) = self.read_gallery(&path).await? {
                galleries.push((stem, gallery));
            }
        }
        galleries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(galleries)
    }

    async fn blog_files(&self, language: &str) -> StoreResult<Vec<BlogPost>> {
        let Some(dir) = self.path(language, &["blog"]) else {
            return Ok(Vec::new());
        };
        let mut posts = Vec::new();
        for (stem, path) in list_files(&dir, "md").await? {
            let raw = tokio::fs::read_to_string(&path).await?;
            posts.push(parse_blog_post(&raw, &stem, language, &path)?);
        }
        Ok(posts)
    }

    async fn languages(&self) -> StoreResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut languages = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    languages.push(name.to_string());
                }
            }
        }
        languages.sort();
        Ok(languages)
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn content_entry(&self, language: &str, key: &str) -> StoreResult<Option<ContentEntry>> {
        let entries = self.content_entries(language).await?;
        Ok(entries.into_iter().find(|c| c.key == key))
    }

    async fn content_entries(&self, language: &str) -> StoreResult<Vec<ContentEntry>> {
        let Some(path) = self.path(language, &["content.json"]) else {
            return Ok(Vec::new());
        };
        let values: BTreeMap<String, String> = self.read_json(&path).await?;
        Ok(values
            .into_iter()
            .map(|(key, value)| ContentEntry {
                id: None,
                language: language.to_string(),
                key,
                value,
            })
            .collect())
    }

    async fn projects(&self, language: &str) -> StoreResult<Vec<Project>> {
        let Some(path) = self.path(language, &["projects.json"]) else {
            return Ok(Vec::new());
        };
        let mut projects: Vec<Project> = self.read_json(&path).await?;
        for project in &mut projects {
            project.language = language.to_string();
        }
        projects.sort_by_key(|p| p.display_order);
        Ok(projects)
    }

    async fn project(&self, id: i32, language: &str) -> StoreResult<Option<Project>> {
        let projects = self.projects(language).await?;
        Ok(projects.into_iter().find(|p| p.id == id))
    }

    async fn papers(&self, language: &str) -> StoreResult<Vec<Paper>> {
        let Some(path) = self.path(language, &["papers.json"]) else {
            return Ok(Vec::new());
        };
        let mut papers: Vec<Paper> = self.read_json(&path).await?;
        for paper in &mut papers {
            paper.language = language.to_string();
        }
        papers.sort_by(|a, b| b.year.cmp(&a.year));
        Ok(papers)
    }

    async fn paper(&self, id: i32, language: &str) -> StoreResult<Option<Paper>> {
        let papers = self.papers(language).await?;
        Ok(papers.into_iter().find(|p| p.id == id))
    }

    async fn blog_posts(&self, language: &str) -> StoreResult<Vec<BlogSummary>> {
        let posts = self.blog_files(language).await?;
        let mut summaries: Vec<BlogSummary> = posts.iter().map(BlogSummary::from).collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }

    async fn blog_post(&self, page_name: &str, language: &str) -> StoreResult<Option<BlogPost>> {
        let file_name = format!("{page_name}.md");
        let Some(path) = self.path(language, &["blog", file_name.as_str()]) else {
            return Ok(None);
        };
        match read_optional(&path).await? {
            Some(raw) => parse_blog_post(&raw, page_name, language, &path).map(Some),
            None => Ok(None),
        }
    }

    async fn galleries(&self, language: &str) -> StoreResult<Vec<GallerySummary>> {
        let galleries = self.gallery_files(language).await?;
        Ok(galleries
            .iter()
            .map(|(stem, gallery)| gallery.summary(stem))
            .collect())
    }

    async fn gallery_photos(&self, gallery_name: &str, language: &str) -> StoreResult<Vec<Photo>> {
        let file_name = format!("{gallery_name}.json");
        let Some(path) = self.path(language, &["galleries", file_name.as_str()]) else {
            return Ok(Vec::new());
        };
        Ok(self
            .read_gallery(&path)
            .await?
            .map(|gallery| gallery.into_photos(gallery_name, language))
            .unwrap_or_default())
    }

    async fn photo(&self, id: i32) -> StoreResult<Option<Photo>> {
        for language in self.languages().await? {
            for (stem, gallery) in self.gallery_files(&language).await? {
                if let Some(photo) = gallery
                    .into_photos(&stem, &language)
                    .into_iter()
                    .find(|p| p.id == id)
                {
                    return Ok(Some(photo));
                }
            }
        }
        Ok(None)
    }
}

/// A single path component with no way to climb out of its parent.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && !segment.contains("..")
        && !segment.contains(['/', '\\', '\0'])
}

async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Regular files in `dir` with `extension`, as `(stem, path)`.
async fn list_files(dir: &Path, extension: &str) -> StoreResult<Vec<(String, PathBuf)>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(extension)
        {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            files.push((stem.to_string(), path.clone()));
        }
    }
    Ok(files)
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    date: Option<String>,
}

fn parse_blog_post(raw: &str, page_name: &str, language: &str, path: &Path) -> StoreResult<BlogPost> {
    let front_matter_error = |message: String| StoreError::FrontMatter {
        path: path.display().to_string(),
        message,
    };

    let (meta, body) = split_front_matter(raw);
    let meta: FrontMatter = match meta {
        Some(yaml) if !yaml.trim().is_empty() => {
            serde_yaml::from_str(yaml).map_err(|e| front_matter_error(e.to_string()))?
        }
        _ => FrontMatter::default(),
    };

    let parse = |field: &str, value: &Option<String>| -> StoreResult<Option<DateTime<Utc>>> {
        match value {
            Some(v) => parse_timestamp(v)
                .map(Some)
                .ok_or_else(|| front_matter_error(format!("invalid {field} '{v}'"))),
            None => Ok(None),
        }
    };
    let created_at = parse("created_at", &meta.created_at.or(meta.date))?;
    let updated_at = parse("updated_at", &meta.updated_at)?.or(created_at);

    Ok(BlogPost {
        id: None,
        language: language.to_string(),
        page_name: page_name.to_string(),
        title: meta.title.unwrap_or_else(|| page_name.to_string()),
        content: body.trim_start().to_string(),
        created_at,
        updated_at,
    })
}

/// Split `---\n{yaml}\n---\n{body}`. Text without an opening delimiter is all body.
fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw
        .strip_prefix(FRONT_MATTER_DELIMITER)
        .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
    else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, raw)
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
