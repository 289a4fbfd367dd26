//! Application error types.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::services::article::ArticleError;
use crate::services::auth::AuthError;
use crate::store::StoreError;

/// Per-field validation messages.
///
/// Serializes as `{ "errors": { field: message } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("validation failed")]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::NotFound,
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Internal(e) => AppError::Internal(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => AppError::Unauthorized,
            AuthError::InvalidCredentials => AppError::Unauthorized,
            AuthError::Forbidden(_) => AppError::Forbidden,
            AuthError::NotWhitelisted => AppError::Forbidden,
            AuthError::EmailTaken => AppError::Conflict(e.to_string()),
            AuthError::InvalidEmail => {
                let mut errors = ValidationErrors::new();
                errors.add("email", e.to_string());
                AppError::Validation(errors)
            }
            AuthError::WeakPassword => {
                let mut errors = ValidationErrors::new();
                errors.add("password", e.to_string());
                AppError::Validation(errors)
            }
            AuthError::Store(e) => AppError::from(e),
            AuthError::Session(e) => AppError::Internal(anyhow::Error::new(e)),
            AuthError::Internal(e) => AppError::Internal(e),
        }
    }
}

impl From<ArticleError> for AppError {
    fn from(e: ArticleError) -> Self {
        match e {
            ArticleError::Invalid(errors) => AppError::Validation(errors),
            ArticleError::NotFound => AppError::NotFound,
            ArticleError::SlugTaken(_) => AppError::Conflict(e.to_string()),
            ArticleError::Serialize(e) => AppError::Internal(anyhow::Error::new(e)),
            ArticleError::Store(e) => AppError::from(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal detail goes to the log, never to the client
        match self {
            AppError::Validation(errors) => (status, Json(errors)).into_response(),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                (status, Json(json!({ "error": "internal server error" }))).into_response()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (status, Json(json!({ "error": "internal server error" }))).into_response()
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Title is required");
        errors.add("title", "Title is too long");
        errors.add("slug", "Slug is required");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["slug", "title"]);
    }

    #[test]
    fn serializes_under_errors_key() {
        let mut errors = ValidationErrors::new();
        errors.add("slug", "Slug is required");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value, json!({ "errors": { "slug": "Slug is required" } }));
    }

    #[test]
    fn empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::NotFound, StatusCode::NOT_FOUND),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                AppError::Validation(ValidationErrors::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn store_conflict_maps_to_conflict() {
        let error = AppError::from(StoreError::Conflict("slug taken".into()));
        assert!(matches!(error, AppError::Conflict(_)));
    }
}
