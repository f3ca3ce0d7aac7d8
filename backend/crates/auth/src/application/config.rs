//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing and password reset digests
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime (1 hour)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (1 day)
    pub refresh_token_ttl: Duration,
    /// Password reset link lifetime (3 days)
    pub password_reset_ttl: Duration,
    /// Frontend page that receives `/{uid}/{token}`
    pub password_reset_url: String,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Reject passwords found in the HIBP corpus
    pub check_breached_passwords: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: vec![0u8; 32],
            access_token_ttl: Duration::from_secs(3600),
            refresh_token_ttl: Duration::from_secs(24 * 3600),
            password_reset_ttl: Duration::from_secs(3 * 24 * 3600),
            password_reset_url: "http://localhost:3000/reset-password".to_string(),
            password_pepper: None,
            check_breached_passwords: false,
        }
    }
}

impl AuthConfig {
    /// Create config with a random signing secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            jwt_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (random secret, no breach lookups)
    pub fn development() -> Self {
        Self {
            check_breached_passwords: false,
            ..Self::with_random_secret()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Link mailed to users who asked for a password reset
    pub fn password_reset_link(&self, uid: &str, token: &str) -> String {
        format!(
            "{}/{}/{}",
            self.password_reset_url.trim_end_matches('/'),
            uid,
            token
        )
    }
}
