//! Auth (Accounts) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, reset tokens
//! - `application/` - Use cases and JWT service
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - Registration with field-keyed validation errors
//! - Login by user name or email, returning an access + refresh JWT pair
//! - Access token refresh
//! - Password reset by mailed, stateless, single-use link
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - HS256 JWTs; access and refresh tokens are not interchangeable
//! - Reset tokens are bound to the password hash and last login, so they
//!   die after use or after any later login

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::middleware::{
    AccessGuard, AuthenticatedUser, require_access_token, require_staff,
};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
