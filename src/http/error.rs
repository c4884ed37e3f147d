//! Error responses.
//!
//! Every failure leaves the API as `{"error": "<message>"}`. Internal errors
//! are logged here and reach the client only as a generic message.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::roms::{ScanError, ScrapeError};
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(&'static str),
    BadRequest(String),
    Unauthorized,
    Unavailable(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            ApiError::NotFound(message) => *message,
            ApiError::BadRequest(message) | ApiError::Unavailable(message) => message.as_str(),
            ApiError::Unauthorized => "Unauthorized",
            ApiError::BadGateway(_) => "Metadata provider request failed",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(detail) => tracing::error!(error = %detail, "Request failed"),
            ApiError::BadGateway(detail) => tracing::warn!(error = %detail, "Upstream failure"),
            _ => {}
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ScrapeError> for ApiError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::NotConfigured(_) => ApiError::Unavailable(e.to_string()),
            ScrapeError::GameNotFound => ApiError::NotFound("Game not found"),
            ScrapeError::NoMatch => ApiError::NotFound("No metadata match found"),
            ScrapeError::UnsupportedConsole(_) => ApiError::BadRequest(e.to_string()),
            ScrapeError::Http(_) | ScrapeError::Upstream { .. } | ScrapeError::Decode(_) => {
                ApiError::BadGateway(e.to_string())
            }
            ScrapeError::Store(inner) => inner.into(),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::NotConfigured | ScanError::Missing(_) => ApiError::Unavailable(e.to_string()),
            ScanError::Store(inner) => inner.into(),
            ScanError::Walk(_) | ScanError::Join(_) => ApiError::Internal(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_error_mapping() {
        let cases = [
            (ScrapeError::NotConfigured("IGDB"), StatusCode::SERVICE_UNAVAILABLE),
            (ScrapeError::GameNotFound, StatusCode::NOT_FOUND),
            (ScrapeError::NoMatch, StatusCode::NOT_FOUND),
            (ScrapeError::UnsupportedConsole("vectrex".into()), StatusCode::BAD_REQUEST),
            (ScrapeError::Decode("bad".into()), StatusCode::BAD_GATEWAY),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status(), status);
        }
    }

    #[test]
    fn test_internal_message_is_generic() {
        let error = ApiError::Internal("connection refused".into());
        assert_eq!(error.message(), "Internal server error");
        assert_eq!(ApiError::NotFound("Paper not found").message(), "Paper not found");
    }
}
