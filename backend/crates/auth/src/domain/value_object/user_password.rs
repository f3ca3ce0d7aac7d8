//! User Password Value Objects
//!
//! - `RawPassword`: validated clear text (zeroized on drop)
//! - `UserPassword`: Argon2id PHC hash, safe to store

use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

/// Clear text password submitted by a user
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a new password against the policy
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        ClearTextPassword::new(raw).map(Self)
    }

    /// Wrap a login candidate without policy checks
    pub fn for_verification(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }

    /// Reject passwords that resemble the user name or email local part
    pub fn check_similarity(
        &self,
        user_name: &str,
        email_local_part: &str,
    ) -> Result<(), PasswordPolicyError> {
        self.0.check_similarity(&[
            ("username", user_name),
            ("email address", email_local_part),
        ])
    }

    /// Look the password up in the HIBP breach corpus
    pub async fn is_compromised(&self) -> Result<bool, PasswordHashError> {
        self.0.check_breach().await
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Hashed password (PHC string)
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> Result<Self, PasswordHashError> {
        raw.inner().hash(pepper).map(Self)
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> Result<Self, PasswordHashError> {
        HashedPassword::from_phc_string(phc_string).map(Self)
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
