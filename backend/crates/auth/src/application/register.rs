//! Register Use Case
//!
//! Creates a new user account. Every failing field is reported at once.

use std::sync::Arc;

use kernel::error::field_errors::FieldErrors;
use platform::password::PasswordPolicyError;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Register input (fields may be absent in the request body)
pub struct RegisterInput {
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Register use case
pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<User> {
        let mut errors = FieldErrors::new();

        // User name
        let user_name = match errors.require("username", input.user_name.as_deref()) {
            Some(raw) => match UserName::new(raw) {
                Ok(name) => {
                    if self.user_repo.exists_by_user_name(&name).await? {
                        errors.add("username", "A user with that username already exists.");
                    }
                    Some(name)
                }
                Err(e) => {
                    errors.add("username", e.to_string());
                    None
                }
            },
            None => None,
        };

        // Email
        let email = match errors.require("email", input.email.as_deref()) {
            Some(raw) => match Email::new(raw) {
                Ok(email) => {
                    if self.user_repo.exists_by_email(&email).await? {
                        errors.add("email", "A user with that email already exists.");
                    }
                    Some(email)
                }
                Err(e) => {
                    errors.add("email", e.to_string());
                    None
                }
            },
            None => None,
        };

        // Password
        let password = match input.password.filter(|p| !p.is_empty()) {
            Some(raw) => self
                .validate_password(raw, user_name.as_ref(), email.as_ref(), &mut errors)
                .await,
            None => {
                errors.add("password", "This field is required.");
                None
            }
        };

        let (Some(user_name), Some(email), Some(password), true) =
            (user_name, email, password, errors.is_empty())
        else {
            return Err(AuthError::Validation(errors));
        };

        let password_hash = UserPassword::from_raw(&password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = User::new(user_name, email, password_hash);
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(user)
    }

    async fn validate_password(
        &self,
        raw: String,
        user_name: Option<&UserName>,
        email: Option<&Email>,
        errors: &mut FieldErrors,
    ) -> Option<RawPassword> {
        let password = match RawPassword::new(raw) {
            Ok(p) => p,
            Err(e) => {
                errors.add("password", e.to_string());
                return None;
            }
        };

        let name = user_name.map(UserName::original).unwrap_or_default();
        let local = email.map(Email::local_part).unwrap_or_default();
        if let Err(e) = password.check_similarity(name, local) {
            errors.add("password", e.to_string());
            return None;
        }

        if self.config.check_breached_passwords {
            match password.is_compromised().await {
                Ok(true) => {
                    errors.add("password", PasswordPolicyError::Compromised.to_string());
                    return None;
                }
                Ok(false) => {}
                // Breach lookups are advisory
                Err(e) => tracing::warn!(error = %e, "Password breach check unavailable"),
            }
        }

        Some(password)
    }
}
