use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A photo, carrying the metadata of the gallery it belongs to.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Photo {
    pub id: i32,
    pub language: String,
    pub gallery_name: String,
    #[serde(default)]
    pub gallery_category: Option<String>,
    #[serde(default)]
    pub gallery_description: Option<String>,
    #[serde(default)]
    #[sqlx(json)]
    pub gallery_tags: Vec<String>,
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

/// One row per distinct gallery.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct GallerySummary {
    pub gallery_name: String,
    pub gallery_category: Option<String>,
    pub gallery_description: Option<String>,
    #[sqlx(json)]
    pub gallery_tags: Vec<String>,
}

impl From<&Photo> for GallerySummary {
    fn from(photo: &Photo) -> Self {
        Self {
            gallery_name: photo.gallery_name.clone(),
            gallery_category: photo.gallery_category.clone(),
            gallery_description: photo.gallery_description.clone(),
            gallery_tags: photo.gallery_tags.clone(),
        }
    }
}
