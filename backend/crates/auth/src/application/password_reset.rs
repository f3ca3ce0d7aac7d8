//! Password Reset Use Cases
//!
//! - Request: mail a link `PASSWORD_RESET_URL/{uid}/{token}` to the account
//! - Confirm: check uid + token against the current account state and set
//!   the new password

use std::sync::Arc;

use chrono::Utc;
use kernel::error::field_errors::FieldErrors;
use kernel::id::UserId;
use platform::crypto::{from_base64url, to_base64url};
use platform::mail::{Mailer, OutgoingMail};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::services::PasswordResetTokens;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Encode a user id for reset links
pub fn encode_uid(user_id: &UserId) -> String {
    to_base64url(user_id.to_string().as_bytes())
}

/// Decode a reset link uid; `None` on any malformed input
pub fn decode_uid(uid: &str) -> Option<UserId> {
    let bytes = from_base64url(uid).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    text.parse().ok()
}

// ============================================================================
// Request
// ============================================================================

/// Password reset request use case
pub struct RequestPasswordResetUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> RequestPasswordResetUseCase<U, M>
where
    U: UserRepository,
    M: Mailer + Sync,
{
    pub fn new(user_repo: Arc<U>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: Option<String>) -> AuthResult<()> {
        let mut errors = FieldErrors::new();
        let Some(raw) = errors.require("email", email.as_deref()) else {
            return Err(AuthError::Validation(errors));
        };
        let email = Email::new(raw).map_err(|e| FieldErrors::single("email", e.to_string()))?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        let tokens = PasswordResetTokens::new(&self.config.jwt_secret, self.config.password_reset_ttl);
        let token = tokens.make_token(&user, Utc::now());
        let link = self
            .config
            .password_reset_link(&encode_uid(&user.user_id), &token);

        let mail = OutgoingMail {
            to: user.email.to_string(),
            subject: "Password reset".to_string(),
            body: format!(
                "Hello {},\n\nUse the link below to choose a new password:\n\n{}\n\n\
                 If you did not ask for a password reset, you can ignore this message.\n",
                user.user_name, link
            ),
        };
        self.mailer.send(mail).await?;

        tracing::info!(user_id = %user.user_id, "Password reset link sent");

        Ok(())
    }
}

// ============================================================================
// Confirm
// ============================================================================

/// Password reset confirm input
pub struct ConfirmPasswordResetInput {
    pub uid: String,
    pub token: String,
    pub password: Option<String>,
}

/// Password reset confirm use case
pub struct ConfirmPasswordResetUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> ConfirmPasswordResetUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: ConfirmPasswordResetInput) -> AuthResult<()> {
        let mut user = self.resolve(&input.uid, &input.token).await?;

        let Some(raw) = input.password.filter(|p| !p.is_empty()) else {
            return Err(FieldErrors::single("password", "This field is required.").into());
        };
        let password =
            RawPassword::new(raw).map_err(|e| FieldErrors::single("password", e.to_string()))?;
        password
            .check_similarity(user.user_name.original(), user.email.local_part())
            .map_err(|e| FieldErrors::single("password", e.to_string()))?;

        let hash = UserPassword::from_raw(&password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        user.set_password(hash);
        self.user_repo
            .set_password(&user.user_id, &user.password, user.updated_at)
            .await?;

        tracing::info!(user_id = %user.user_id, "Password reset completed");

        Ok(())
    }

    /// Every failure collapses into the same error
    async fn resolve(&self, uid: &str, token: &str) -> AuthResult<User> {
        let user_id = decode_uid(uid).ok_or(AuthError::InvalidResetToken)?;
        let user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let tokens = PasswordResetTokens::new(&self.config.jwt_secret, self.config.password_reset_ttl);
        if !tokens.check_token(&user, token, Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }

        Ok(user)
    }
}
