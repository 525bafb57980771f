/// Configuration management for blog-service
///
/// Everything comes from environment variables (after `.env` is loaded by
/// `main`). Unset variables fall back to development defaults; production
/// refuses to start without a real JWT secret.
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::media::DEFAULT_MAX_UPLOAD_BYTES;
use crate::pagination::DEFAULT_PAGE_SIZE;

const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub feed: FeedConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Unset means the in-process store is used
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Posts per page (`AMOUNT`)
    pub page_size: usize,
    pub index_cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded images are written under
    pub root: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    #[serde(skip_serializing)]
    pub admin_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = env.eq_ignore_ascii_case("production");

        let page_size: usize = parse_env_or_default("AMOUNT", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            bail!("AMOUNT must be at least 1");
        }

        let jwt_secret = match non_empty_var("JWT_SECRET") {
            Some(secret) => secret,
            None if is_production => bail!("JWT_SECRET must be set in production"),
            None => {
                tracing::warn!("JWT_SECRET not set, using an insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Config {
            app: AppConfig {
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("PORT", 8000)?,
                workers: parse_env_or_default("HTTP_WORKERS", 4)?,
                env,
            },
            database: DatabaseConfig {
                url: non_empty_var("DATABASE_URL"),
                max_connections: parse_env_or_default("DB_MAX_CONNECTIONS", 20)?,
                min_connections: parse_env_or_default("DB_MIN_CONNECTIONS", 5)?,
            },
            feed: FeedConfig {
                page_size,
                index_cache_ttl_secs: parse_env_or_default("INDEX_CACHE_TTL_SECS", 20)?,
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_ttl_hours: parse_env_or_default("JWT_TTL_HOURS", 24)?,
                admin_token: non_empty_var("ADMIN_TOKEN"),
            },
            media: MediaConfig {
                root: non_empty_var("MEDIA_ROOT").unwrap_or_else(|| "media".to_string()),
                max_upload_bytes: parse_env_or_default(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_UPLOAD_BYTES,
                )?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }

    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed.index_cache_ttl_secs)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| anyhow!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
