//! Gallery files (`{lang}/galleries/{name}.json`) and their validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::models::{GallerySummary, Photo};

/// Photos above this size get a warning.
const LARGE_PHOTO_BYTES: u64 = 2 * 1024 * 1024;

const REQUIRED_GALLERY_FIELDS: [&str; 5] = ["name", "category", "description", "tags", "photos"];
const REQUIRED_PHOTO_FIELDS: [&str; 4] = ["id", "filename", "caption", "display_order"];

/// On-disk gallery document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryFile {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub photos: Vec<GalleryPhoto>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GalleryPhoto {
    pub id: i32,
    pub filename: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub taken_date: Option<NaiveDate>,
    #[serde(default)]
    pub display_order: i32,
}

impl GalleryFile {
    /// `gallery_name` is the file stem, which is what the API addresses galleries by.
    pub fn summary(&self, gallery_name: &str) -> GallerySummary {
        GallerySummary {
            gallery_name: gallery_name.to_string(),
            gallery_category: self.category.clone(),
            gallery_description: self.description.clone(),
            gallery_tags: self.tags.clone(),
        }
    }

    /// Flatten into photo rows sorted by display order.
    pub fn into_photos(self, gallery_name: &str, language: &str) -> Vec<Photo> {
        let mut photos: Vec<Photo> = self
            .photos
            .into_iter()
            .map(|p| Photo {
                id: p.id,
                language: language.to_string(),
                gallery_name: gallery_name.to_string(),
                gallery_category: self.category.clone(),
                gallery_description: self.description.clone(),
                gallery_tags: self.tags.clone(),
                filename: p.filename,
                caption: p.caption,
                location: p.location,
                latitude: p.latitude,
                longitude: p.longitude,
                taken_date: p.taken_date,
                display_order: p.display_order,
            })
            .collect();
        photos.sort_by_key(|p| p.display_order);
        photos
    }
}

/// Outcome of [`validate_gallery`]. Only errors make a gallery unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryReport {
    pub photo_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl GalleryReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for GalleryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Photos: {}", self.photo_count)?;
        for error in &self.errors {
            writeln!(f, "error: {error}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        write!(
            f,
            "{} error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// Check a parsed gallery document.
///
/// With `photos_dir`, every photo's file must exist there; empty or large files
/// produce warnings.
pub fn validate_gallery(document: &Value, photos_dir: Option<&Path>) -> GalleryReport {
    let mut report = GalleryReport::default();

    let Some(gallery) = document.as_object() else {
        report.errors.push("gallery must be a JSON object".into());
        return report;
    };

    let missing: Vec<&str> = REQUIRED_GALLERY_FIELDS
        .into_iter()
        .filter(|field| gallery.get(*field).map_or(true, is_blank))
        .collect();
    if !missing.is_empty() {
        report
            .errors
            .push(format!("missing required gallery fields: {}", missing.join(", ")));
        return report;
    }

    let Some(photos) = gallery.get("photos").and_then(Value::as_array) else {
        report.errors.push("photos must be an array".into());
        return report;
    };
    report.photo_count = photos.len();

    let mut seen_ids = HashSet::new();
    let mut seen_orders = HashSet::new();

    for (index, photo) in photos.iter().enumerate() {
        let label = photo
            .get("id")
            .filter(|id| !id.is_null())
            .map_or_else(|| format!("photo {}", index + 1), |id| format!("photo {id}"));

        let missing: Vec<&str> = REQUIRED_PHOTO_FIELDS
            .into_iter()
            .filter(|field| photo.get(*field).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            report
                .errors
                .push(format!("{label}: missing required fields: {}", missing.join(", ")));
        }

        if let (Some(dir), Some(filename)) = (photos_dir, photo.get("filename").and_then(Value::as_str)) {
            check_photo_file(&mut report, &label, &dir.join(filename));
        }

        if let Some(lat) = photo.get("latitude").and_then(Value::as_f64) {
            if !(-90.0..=90.0).contains(&lat) {
                report
                    .errors
                    .push(format!("{label}: invalid latitude {lat} (must be -90 to 90)"));
            }
        }
        if let Some(lon) = photo.get("longitude").and_then(Value::as_f64) {
            if !(-180.0..=180.0).contains(&lon) {
                report
                    .errors
                    .push(format!("{label}: invalid longitude {lon} (must be -180 to 180)"));
            }
        }

        if let Some(date) = photo.get("taken_date").and_then(Value::as_str) {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                report
                    .errors
                    .push(format!("{label}: invalid date '{date}' (use YYYY-MM-DD)"));
            }
        }

        if let Some(id) = photo.get("id").filter(|id| !id.is_null()) {
            if !seen_ids.insert(id.to_string()) {
                report.errors.push(format!("duplicate photo id {id}"));
            }
        }
        if let Some(order) = photo.get("display_order").filter(|o| !o.is_null()) {
            if !seen_orders.insert(order.to_string()) {
                report
                    .warnings
                    .push(format!("duplicate display_order {order}"));
            }
        }
    }

    report
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn check_photo_file(report: &mut GalleryReport, label: &str, path: &Path) {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => {
            report.warnings.push(format!("{label}: photo file is empty"));
        }
        Ok(meta) if meta.len() > LARGE_PHOTO_BYTES => {
            report.warnings.push(format!(
                "{label}: photo file is large ({:.2} MB > 2 MB)",
                meta.len() as f64 / 1024.0 / 1024.0
            ));
        }
        Ok(_) => {}
        Err(_) => {
            report
                .errors
                .push(format!("{label}: photo file not found: {}", path.display()));
        }
    }
}
