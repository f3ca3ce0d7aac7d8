//! Catalog Error Types
//!
//! Catalog-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, field_errors::FieldErrors, kind::ErrorKind};
use thiserror::Error;

/// Catalog-specific result type alias
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Field-keyed input errors
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Book not found")]
    BookNotFound,

    #[error("Genre not found")]
    GenreNotFound,

    #[error("Scraping log not found")]
    ScrapingLogNotFound,

    #[error("Book is not in favorites")]
    FavoriteNotFound,

    /// Transition attempted on a run that already ended
    #[error("Scraping run already finished with status '{0}'")]
    RunFinished(String),

    /// Unique constraint lost a race
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::BookNotFound
            | CatalogError::GenreNotFound
            | CatalogError::ScrapingLogNotFound
            | CatalogError::FavoriteNotFound => StatusCode::NOT_FOUND,
            CatalogError::RunFinished(_) | CatalogError::Conflict(_) => StatusCode::CONFLICT,
            CatalogError::Database(_) | CatalogError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::BadRequest,
            CatalogError::BookNotFound
            | CatalogError::GenreNotFound
            | CatalogError::ScrapingLogNotFound
            | CatalogError::FavoriteNotFound => ErrorKind::NotFound,
            CatalogError::RunFinished(_) | CatalogError::Conflict(_) => ErrorKind::Conflict,
            CatalogError::Database(_) | CatalogError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError; server-side details stay in the log
    pub fn to_app_error(&self) -> AppError {
        match self {
            CatalogError::Validation(fields) => AppError::validation(fields.clone()),
            CatalogError::Database(_) | CatalogError::Internal(_) => {
                AppError::new(self.kind(), "An internal error occurred")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            CatalogError::Database(e) => {
                tracing::error!(error = %e, "Catalog database error");
            }
            CatalogError::Internal(msg) => {
                tracing::error!(message = %msg, "Catalog internal error");
            }
            CatalogError::RunFinished(status) => {
                tracing::warn!(status = %status, "Rejected transition on finished scraping run");
            }
            _ => {
                tracing::debug!(error = %self, "Catalog error");
            }
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<FieldErrors> for CatalogError {
    fn from(fields: FieldErrors) -> Self {
        CatalogError::Validation(fields)
    }
}
