//! Service settings loaded from `RECIPE_*` environment variables

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use config::{Config, Environment};
use serde::Deserialize;

use crate::{jwt::JwtConfig, rate_limiter::RateLimiterConfig};

/// Service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// HS256 signing secret; required
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub token_expiry: u64,
    /// Directory uploaded media is written to and served from
    pub media_root: PathBuf,
    /// URL prefix the media root is served under
    pub media_url: String,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
}

impl Settings {
    /// Read settings from the environment, applying defaults for everything
    /// except the JWT secret.
    pub fn from_env() -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("jwt_secret", "")?
            .set_default("token_expiry", 604_800)? // 7 days
            .set_default("media_root", "./media")?
            .set_default("media_url", "/media")?
            .set_default("login_max_attempts", 5)?
            .set_default("login_window_seconds", 300)?
            .set_default("login_ban_seconds", 3600)?
            .add_source(Environment::with_prefix("RECIPE").try_parsing(true))
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        if settings.jwt_secret.trim().is_empty() {
            bail!("RECIPE_JWT_SECRET environment variable not set");
        }
        if settings.media_url.trim_matches('/').is_empty() {
            bail!("RECIPE_MEDIA_URL must name a path below the site root");
        }

        Ok(settings)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            token_expiry: self.token_expiry,
        }
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.login_max_attempts,
            window_seconds: self.login_window_seconds,
            ban_duration_seconds: self.login_ban_seconds,
        }
    }
}
