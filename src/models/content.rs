use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One i18n UI string, unique per `(language, key)`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub language: String,
    pub key: String,
    pub value: String,
}
