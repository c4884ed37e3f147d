use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A published paper.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Paper {
    pub id: i32,
    #[serde(default)]
    pub language: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    #[sqlx(rename = "abstract")]
    pub summary: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    pub year: i32,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
