//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, field_errors::FieldErrors, kind::ErrorKind};
use platform::mail::MailError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-keyed input errors
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Login called without identifier or password
    #[error("Username or email and password are required")]
    FieldsRequired,

    /// Wrong identifier or password (intentionally non-specific)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bearer token missing from a protected request
    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    /// JWT failed verification, expired, or has the wrong type
    #[error("Token is invalid or expired")]
    InvalidToken,

    /// Authenticated but not allowed (non-staff on staff routes)
    #[error("You do not have permission to perform this action")]
    PermissionDenied,

    /// No account for the given email
    #[error("No user is associated with this email address")]
    EmailNotFound,

    /// Password reset link could not be validated
    #[error("Invalid or expired token")]
    InvalidResetToken,

    /// Unique constraint lost a race
    #[error("A user with that username or email already exists")]
    AccountConflict,

    /// Outbound mail failed
    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) | AuthError::FieldsRequired | AuthError::InvalidResetToken => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials | AuthError::NotAuthenticated | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::EmailNotFound => StatusCode::NOT_FOUND,
            AuthError::AccountConflict => StatusCode::CONFLICT,
            AuthError::Mail(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::FieldsRequired | AuthError::InvalidResetToken => {
                ErrorKind::BadRequest
            }
            AuthError::InvalidCredentials | AuthError::NotAuthenticated | AuthError::InvalidToken => {
                ErrorKind::Unauthorized
            }
            AuthError::PermissionDenied => ErrorKind::Forbidden,
            AuthError::EmailNotFound => ErrorKind::NotFound,
            AuthError::AccountConflict => ErrorKind::Conflict,
            AuthError::Mail(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Server-side failures get a generic message; details stay in the log.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Validation(fields) => AppError::validation(fields.clone()),
            AuthError::Mail(_) => {
                AppError::new(self.kind(), "Could not send mail, please try again later")
            }
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::new(self.kind(), "An internal error occurred")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Mail(e) => {
                tracing::error!(error = %e, "Auth mail delivery error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken => {
                tracing::warn!("Rejected bearer token");
            }
            AuthError::InvalidResetToken => {
                tracing::warn!("Rejected password reset token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<FieldErrors> for AuthError {
    fn from(fields: FieldErrors) -> Self {
        AuthError::Validation(fields)
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
