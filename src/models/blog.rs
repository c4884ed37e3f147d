use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A full blog post. `content` is markdown.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlogPost {
    /// Absent for posts loaded from the content directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub language: String,
    pub page_name: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Listing view of a post, without the body.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BlogSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub page_name: String,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&BlogPost> for BlogSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.id,
            page_name: post.page_name.clone(),
            title: post.title.clone(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Newest first; posts without a timestamp go last.
pub fn sort_newest_first(posts: &mut [BlogSummary]) {
    posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
