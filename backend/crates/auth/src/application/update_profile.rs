//! Update Profile Use Case
//!
//! Changes the user name and/or email of the signed-in account. Absent
//! fields keep their stored value; present ones are validated like
//! registration, with uniqueness checked against other accounts only.

use std::sync::Arc;

use kernel::error::field_errors::FieldErrors;
use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

/// Profile update input
pub struct UpdateProfileInput {
    pub user_name: Option<String>,
    pub email: Option<String>,
}

/// Update profile use case
pub struct UpdateProfileUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UpdateProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, user_id: &UserId, input: UpdateProfileInput) -> AuthResult<User> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.can_login())
            .ok_or(AuthError::InvalidToken)?;

        let mut errors = FieldErrors::new();

        let user_name = match input.user_name {
            Some(raw) => match UserName::new(&raw) {
                Ok(name) => {
                    let owner = self.user_repo.find_by_user_name(&name).await?;
                    if owner.is_some_and(|o| o.user_id != user.user_id) {
                        errors.add("username", "A user with that username already exists.");
                    }
                    Some(name)
                }
                Err(e) => {
                    errors.add("username", e.to_string());
                    None
                }
            },
            None => Some(user.user_name.clone()),
        };

        let email = match input.email {
            Some(raw) => match Email::new(&raw) {
                Ok(email) => {
                    let owner = self.user_repo.find_by_email(&email).await?;
                    if owner.is_some_and(|o| o.user_id != user.user_id) {
                        errors.add("email", "A user with that email already exists.");
                    }
                    Some(email)
                }
                Err(e) => {
                    errors.add("email", e.to_string());
                    None
                }
            },
            None => Some(user.email.clone()),
        };

        let (Some(user_name), Some(email), true) = (user_name, email, errors.is_empty()) else {
            return Err(AuthError::Validation(errors));
        };

        user.change_profile(user_name, email);
        self.user_repo.update_profile(&user).await?;

        tracing::info!(user_id = %user.user_id, user_name = %user.user_name, "Profile updated");

        Ok(user)
    }
}
