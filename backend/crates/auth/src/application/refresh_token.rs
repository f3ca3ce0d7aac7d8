//! Refresh Token Use Case
//!
//! Exchanges a refresh token for a new access token.

use std::sync::Arc;

use crate::application::tokens::{JwtService, TokenType};
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Refresh token use case
pub struct RefreshTokenUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<JwtService>,
}

impl<U> RefreshTokenUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<JwtService>) -> Self {
        Self { user_repo, tokens }
    }

    /// Returns a new access token
    pub async fn execute(&self, refresh: &str) -> AuthResult<String> {
        let claims = self.tokens.verify(refresh, TokenType::Refresh)?;

        // Account may have been disabled since the refresh token was issued
        let user = self
            .user_repo
            .find_by_id(&claims.user_id()?)
            .await?
            .filter(|u| u.can_login())
            .ok_or(AuthError::InvalidToken)?;

        self.tokens.issue(&user, TokenType::Access)
    }
}
