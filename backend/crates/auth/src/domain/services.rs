//! Domain Services
//!
//! Password reset tokens.
//!
//! A token is `<issued_at base36>-<digest>`. The digest is an HMAC over the
//! user's id, password hash, last login, email and the issue timestamp, so it
//! stops verifying as soon as any of those change: a completed reset (new
//! hash) or a later login both invalidate outstanding links. Nothing is
//! stored server-side.

use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::crypto::{constant_time_eq, from_base36, hmac_sha256, sha256, to_base36, to_hex};

use crate::domain::entity::user::User;

/// Key derivation salt, keeps reset digests apart from other uses of the secret
const KEY_SALT: &[u8] = b"bookstore.auth.password_reset";

/// Hex characters kept from the MAC
const DIGEST_LEN: usize = 20;

/// Issues and checks password reset tokens
#[derive(Clone)]
pub struct PasswordResetTokens {
    key: [u8; 32],
    ttl: Duration,
}

impl PasswordResetTokens {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut material = KEY_SALT.to_vec();
        material.extend_from_slice(secret);
        Self {
            key: sha256(&material),
            ttl,
        }
    }

    /// Token for `user` as of `now`
    pub fn make_token(&self, user: &User, now: DateTime<Utc>) -> String {
        let timestamp = now.timestamp().max(0) as u64;
        format!("{}-{}", to_base36(timestamp), self.digest(user, timestamp))
    }

    /// Whether `token` was issued for the user's current state and is still fresh
    pub fn check_token(&self, user: &User, token: &str, now: DateTime<Utc>) -> bool {
        let Some((ts_b36, digest)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = from_base36(ts_b36) else {
            return false;
        };

        let expected = self.digest(user, timestamp);
        if !constant_time_eq(expected.as_bytes(), digest.as_bytes()) {
            return false;
        }

        let now = now.timestamp().max(0) as u64;
        now.saturating_sub(timestamp) <= self.ttl.as_secs()
    }

    fn digest(&self, user: &User, timestamp: u64) -> String {
        let last_login = user
            .last_login_at
            .map(|t| t.timestamp().to_string())
            .unwrap_or_default();

        let value = format!(
            "{}{}{}{}{}",
            user.user_id,
            user.password.as_phc_string(),
            last_login,
            user.email,
            timestamp
        );

        to_hex(&hmac_sha256(&self.key, value.as_bytes()))
            .chars()
            .step_by(2)
            .take(DIGEST_LEN)
            .collect()
    }
}
