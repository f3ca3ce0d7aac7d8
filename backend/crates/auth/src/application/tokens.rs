//! JWT Issuance and Verification
//!
//! HS256 access/refresh pairs. The `token_type` claim keeps the two kinds
//! apart: a refresh token is never accepted as a bearer token and vice versa.

use std::time::Duration;

use chrono::Utc;
use derive_more::Display;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::error::{AuthError, AuthResult};

/// Kind of JWT
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[display("access")]
    Access,
    #[display("refresh")]
    Refresh,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    pub staff: bool,
    pub token_type: TokenType,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration (Unix seconds)
    pub exp: u64,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Access + refresh pair returned by login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies JWTs
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(&config.jwt_secret),
            decoding: DecodingKey::from_secret(&config.jwt_secret),
            validation,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Issue a fresh access + refresh pair
    pub fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    /// Issue a single token of the given type
    pub fn issue(&self, user: &User, token_type: TokenType) -> AuthResult<String> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let now = Utc::now().timestamp().max(0) as u64;

        let claims = Claims {
            sub: user.user_id.to_string(),
            username: user.user_name.original().to_string(),
            staff: user.is_staff,
            token_type,
            iat: now,
            exp: now + ttl.as_secs(),
            jti: Uuid::new_v4().simple().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("JWT encoding failed: {e}")))
    }

    /// Verify signature, expiry and type
    pub fn verify(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT verification failed");
            AuthError::InvalidToken
        })?;

        if data.claims.token_type != expected {
            tracing::debug!(
                expected = %expected,
                actual = %data.claims.token_type,
                "JWT type mismatch"
            );
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}
