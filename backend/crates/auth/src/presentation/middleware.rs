//! Auth Middleware
//!
//! Bearer-token guards for protected routes.
//!
//! `require_access_token` verifies the `Authorization: Bearer` access token,
//! reloads the account and stores an [`AuthenticatedUser`] (plus its bare
//! `UserId`, for contexts that don't depend on this crate) in the request
//! extensions. Staff and active flags come from the stored row, so demoting
//! or deactivating an account takes effect on its next request.
//! `require_staff` must run after it and rejects non-staff users.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use kernel::id::UserId;

use crate::application::config::AuthConfig;
use crate::application::current_user::CurrentUserUseCase;
use crate::application::tokens::{JwtService, TokenType};
use crate::domain::repository::UserRepository;
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AccessGuard<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    tokens: Arc<JwtService>,
    repo: Arc<R>,
}

impl<R> AccessGuard<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub fn new(config: &AuthConfig, repo: R) -> Self {
        Self {
            tokens: Arc::new(JwtService::new(config)),
            repo: Arc::new(repo),
        }
    }

    pub(crate) fn from_parts(tokens: Arc<JwtService>, repo: Arc<R>) -> Self {
        Self { tokens, repo }
    }
}

/// Identity carried by a verified access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
    pub is_staff: bool,
}

/// Middleware that requires a valid access token for an active account
pub async fn require_access_token<R>(
    State(guard): State<AccessGuard<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = bearer_token(req.headers()).ok_or(AuthError::NotAuthenticated)?;
    let claims = guard.tokens.verify(token, TokenType::Access)?;

    // Missing or deactivated accounts surface as InvalidToken
    let account = CurrentUserUseCase::new(guard.repo.clone())
        .execute(&claims.user_id()?)
        .await?;

    let user = AuthenticatedUser {
        user_id: account.user_id,
        username: account.user_name.original().to_string(),
        is_staff: account.is_staff,
    };

    tracing::debug!(user_id = %user.user_id, "Bearer token accepted");
    req.extensions_mut().insert(user.user_id);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Middleware that requires a staff account (after `require_access_token`)
pub async fn require_staff(req: Request, next: Next) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::NotAuthenticated)?;

    if !user.is_staff {
        tracing::warn!(user_id = %user.user_id, "Staff route refused");
        return Err(AuthError::PermissionDenied);
    }

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::NotAuthenticated)
    }
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
