//! Server configuration loaded from environment variables.
//!
//! ## Required
//! - `STOREFRONT_JWT_SECRET` - Token signing secret
//!
//! ## Optional
//! - `STOREFRONT_DB_PATH` - SQLite file (default: storefront.db)
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_TOKEN_TTL_DAYS` - Token lifetime in days (default: 30)
//! - `STOREFRONT_ADMIN_EMAILS` - Comma-separated emails granted admin rights

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

use storefront_api::AuthSettings;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
    "secret",
];

const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
    #[error("Insecure secret in {0}: still a placeholder")]
    PlaceholderSecret(&'static str),
}

#[derive(Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub token_ttl_days: i64,
    /// Lower-cased.
    pub admin_emails: Vec<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("db_path", &self.db_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token_ttl_days", &self.token_ttl_days)
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("STOREFRONT_JWT_SECRET").ok_or(ConfigError::MissingEnvVar("STOREFRONT_JWT_SECRET"))?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.to_lowercase().as_str()) {
            return Err(ConfigError::PlaceholderSecret("STOREFRONT_JWT_SECRET"));
        }

        let db_path = get("STOREFRONT_DB_PATH").unwrap_or_else(|| "storefront.db".into()).into();
        let host = get("STOREFRONT_HOST")
            .unwrap_or_else(|| "0.0.0.0".into())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_HOST", e.to_string()))?;
        let port = get("STOREFRONT_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_PORT", e.to_string()))?;
        let token_ttl_days = get("STOREFRONT_TOKEN_TTL_DAYS")
            .unwrap_or_else(|| "30".into())
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_TOKEN_TTL_DAYS", e.to_string()))?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_TOKEN_TTL_DAYS",
                format!("must be between 1 and {}", MAX_TOKEN_TTL_DAYS),
            ));
        }

        let admin_emails = get("STOREFRONT_ADMIN_EMAILS")
            .map(|list| {
                list.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            token_ttl_days,
            admin_emails,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl: chrono::Duration::days(self.token_ttl_days),
            admin_emails: self.admin_emails.clone(),
        }
    }
}
