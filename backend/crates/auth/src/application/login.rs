//! Login Use Case
//!
//! Authenticates by user name or email and issues a JWT pair.
//!
//! The identifier is first tried as a user name. If that does not
//! authenticate, it is looked up as an email and authentication is retried
//! with the owning account. Failures never reveal which part was wrong.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::tokens::{JwtService, TokenPair};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    /// User name or email
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// Login output
pub struct LoginOutput {
    pub tokens: TokenPair,
    pub user: User,
}

/// Login use case
pub struct LoginUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<JwtService>,
    config: Arc<AuthConfig>,
}

impl<U> LoginUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<JwtService>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let identifier = input
            .identifier
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let password = input.password.filter(|p| !p.is_empty());

        let (Some(identifier), Some(password)) = (identifier, password) else {
            return Err(AuthError::FieldsRequired);
        };
        let password = RawPassword::for_verification(password);

        let mut user = match self.authenticate_by_user_name(&identifier, &password).await? {
            Some(user) => user,
            None => self
                .authenticate_by_email(&identifier, &password)
                .await?
                .ok_or(AuthError::InvalidCredentials)?,
        };

        user.record_login();
        self.user_repo
            .record_login(&user.user_id, user.updated_at)
            .await?;

        let tokens = self.tokens.issue_pair(&user)?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(LoginOutput { tokens, user })
    }

    async fn authenticate_by_user_name(
        &self,
        identifier: &str,
        password: &RawPassword,
    ) -> AuthResult<Option<User>> {
        let Ok(user_name) = UserName::new(identifier) else {
            return Ok(None);
        };
        let user = self.user_repo.find_by_user_name(&user_name).await?;
        Ok(user.filter(|u| self.check(u, password)))
    }

    async fn authenticate_by_email(
        &self,
        identifier: &str,
        password: &RawPassword,
    ) -> AuthResult<Option<User>> {
        let Ok(email) = Email::new(identifier) else {
            return Ok(None);
        };
        let Some(owner) = self.user_repo.find_by_email(&email).await? else {
            return Ok(None);
        };

        // Retry with the account's actual user name
        self.authenticate_by_user_name(owner.user_name.original(), password)
            .await
    }

    fn check(&self, user: &User, password: &RawPassword) -> bool {
        user.can_login() && user.password.verify(password, self.config.pepper())
    }
}
