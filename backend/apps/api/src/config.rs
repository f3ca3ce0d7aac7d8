//! Server Configuration
//!
//! Everything the binary reads from the environment, resolved once at
//! startup into the per-context config structs.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use catalog::CatalogConfig;
use platform::mail::SmtpSettings;

pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub database_max_connections: u32,
    pub frontend_origins: Vec<String>,
    pub auth: AuthConfig,
    pub catalog: CatalogConfig,
    /// `None` means reset mails only go to the log
    pub smtp: Option<SmtpSettings>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), cfg!(debug_assertions))
    }

    /// `dev` allows a random JWT secret when none is configured
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, dev: bool) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let bind_addr = parse_or(&var, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8000)))?;
        let database_max_connections = parse_or(&var, "DATABASE_MAX_CONNECTIONS", 5u32)?;

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let base = match var("JWT_SECRET") {
            Some(secret) if secret.len() < 32 => {
                bail!("JWT_SECRET must be at least 32 bytes")
            }
            Some(secret) => AuthConfig {
                jwt_secret: secret.into_bytes(),
                ..AuthConfig::default()
            },
            None if dev => {
                tracing::warn!("JWT_SECRET not set, using a random secret");
                AuthConfig::development()
            }
            None => bail!("JWT_SECRET must be set in production"),
        };

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            access_token_ttl: secs_or(&var, "ACCESS_TOKEN_TTL_SECS", defaults.access_token_ttl)?,
            refresh_token_ttl: secs_or(&var, "REFRESH_TOKEN_TTL_SECS", defaults.refresh_token_ttl)?,
            password_reset_ttl: secs_or(
                &var,
                "PASSWORD_RESET_TTL_SECS",
                defaults.password_reset_ttl,
            )?,
            password_reset_url: var("PASSWORD_RESET_URL").unwrap_or(defaults.password_reset_url),
            password_pepper: var("PASSWORD_PEPPER").map(String::into_bytes),
            check_breached_passwords: parse_or(&var, "CHECK_BREACHED_PASSWORDS", false)?,
            ..base
        };

        let catalog_defaults = CatalogConfig::default();
        let catalog = CatalogConfig {
            media_root: var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(catalog_defaults.media_root.clone()),
            media_url: var("MEDIA_URL").unwrap_or(catalog_defaults.media_url.clone()),
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or(catalog_defaults.public_base_url.clone()),
            ..catalog_defaults
        };

        let smtp = match var("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                username: var("SMTP_USERNAME"),
                password: var("SMTP_PASSWORD"),
                from: var("MAIL_FROM").context("MAIL_FROM must be set when SMTP_HOST is")?,
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            bind_addr,
            database_max_connections,
            frontend_origins,
            auth,
            catalog,
            smtp,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ({raw}): {e}")),
        None => Ok(default),
    }
}

fn secs_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    parse_or(var, key, default.as_secs()).map(Duration::from_secs)
}
