//! Shared request parameter handling.
//!
//! Handlers extract through [`ApiPath`] and [`ApiQuery`] so malformed input is
//! answered with the usual JSON error body.

use axum::extract::{FromRequestParts, Path, Query};
use serde::Deserialize;

use crate::http::error::ApiError;
use crate::models::DEFAULT_LANGUAGE;
use crate::store::files::is_safe_segment;

/// `Path` with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `Query` with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `?language=` on listing and lookup endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LanguageQuery {
    pub language: Option<String>,
}

impl LanguageQuery {
    /// The requested language, `en` when absent.
    pub fn language(&self) -> Result<&str, ApiError> {
        match self.language.as_deref() {
            None | Some("") => Ok(DEFAULT_LANGUAGE),
            Some(language) => segment(language),
        }
    }
}

/// A path parameter that may end up in a file path.
pub fn segment(value: &str) -> Result<&str, ApiError> {
    if is_safe_segment(value) {
        Ok(value)
    } else {
        Err(ApiError::BadRequest("Invalid path segment".to_string()))
    }
}

/// Numeric id from the path. Anything else cannot exist.
pub fn parse_id(raw: &str, not_found: &'static str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound(not_found))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_defaults() {
        assert_eq!(LanguageQuery::default().language().unwrap(), "en");
        let query = LanguageQuery {
            language: Some("gr".into()),
        };
        assert_eq!(query.language().unwrap(), "gr");

        let query = LanguageQuery {
            language: Some("../etc".into()),
        };
        assert!(matches!(query.language(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_segments() {
        assert!(segment("Cricket Memories").is_ok());
        assert!(segment("Sites & Ruins").is_ok());
        assert!(segment("a/b").is_err());
        assert!(segment("..").is_err());
        assert!(segment("").is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "x").unwrap(), 42);
        assert!(matches!(parse_id("abc", "Paper not found"), Err(ApiError::NotFound("Paper not found"))));
    }
}
