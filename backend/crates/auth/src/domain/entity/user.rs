//! User Entity
//!
//! A registered account: identity, credentials and staff flag.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{email::Email, user_name::UserName, user_password::UserPassword};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// User name (unique, case-insensitive)
    pub user_name: UserName,
    /// Email (unique, lowercase)
    pub email: Email,
    /// Argon2id hash
    pub password: UserPassword,
    /// May use the catalog write endpoints
    pub is_staff: bool,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Registration timestamp
    pub date_joined: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active, non-staff user
    pub fn new(user_name: UserName, email: Email, password: UserPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password,
            is_staff: false,
            is_active: true,
            last_login_at: None,
            date_joined: now,
            updated_at: now,
        }
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Replace the password hash
    pub fn set_password(&mut self, password: UserPassword) {
        self.password = password;
        self.updated_at = Utc::now();
    }

    /// Replace user name and email
    pub fn change_profile(&mut self, user_name: UserName, email: Email) {
        self.user_name = user_name;
        self.email = email;
        self.updated_at = Utc::now();
    }

    /// Check if user can login
    pub fn can_login(&self) -> bool {
        self.is_active
    }
}
