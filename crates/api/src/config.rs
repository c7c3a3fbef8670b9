use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::stores::RateLimitPolicy;

/// Which rate-limit store to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    /// Per-process map. Limits are not shared across instances.
    #[default]
    Memory,
    /// Shared Redis store. Requires `redis_url`.
    Redis,
}

/// Read from `STOREFRONT_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database_url: String,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub rate_limit_backend: RateLimitBackend,
    /// HMAC secret for bearer tokens.
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_login_limit")]
    pub login_limit: u32,
    #[serde(default = "default_login_window_ms")]
    pub login_window_ms: u64,
    #[serde(default = "default_download_limit")]
    pub download_limit: u32,
    #[serde(default = "default_download_window_ms")]
    pub download_window_ms: u64,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_login_limit() -> u32 {
    5
}

fn default_login_window_ms() -> u64 {
    15 * 60 * 1000
}

fn default_download_limit() -> u32 {
    30
}

fn default_download_window_ms() -> u64 {
    60 * 1000
}

impl Config {
    /// Reject values that would silently disable rate limiting.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("LOGIN_LIMIT", u64::from(self.login_limit)),
            ("LOGIN_WINDOW_MS", self.login_window_ms),
            ("DOWNLOAD_LIMIT", u64::from(self.download_limit)),
            ("DOWNLOAD_WINDOW_MS", self.download_window_ms),
        ] {
            if value == 0 {
                bail!("STOREFRONT_{} must be greater than 0", name);
            }
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn login_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.login_limit, Duration::from_millis(self.login_window_ms))
    }

    pub fn download_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(
            self.download_limit,
            Duration::from_millis(self.download_window_ms),
        )
    }

    /// Interval for sweeping expired in-memory entries: twice the longest window.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.login_window_ms.max(self.download_window_ms).max(1000) * 2)
    }
}
