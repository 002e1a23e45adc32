use std::env;
use std::time::Duration;

use crate::error::{AppError, Result};

const DEFAULT_PLATFORM_API_BASE_URL: &str = "https://app.ecwid.com/api/v3";

/// Connection details for the e-commerce platform's REST API.
///
/// Store identity and token are optional so a development deployment can run
/// without them; the order client then reports every fetch as unavailable.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub api_base_url: String,
    pub store_id: Option<String>,
    pub access_token: Option<String>,
    /// Upper bound for a single order-detail request.
    pub timeout: Duration,
}

impl PlatformConfig {
    pub fn is_configured(&self) -> bool {
        self.store_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub dev_mode: bool,
    /// Shared HMAC secret for inbound webhooks. `None` disables verification.
    pub webhook_secret: Option<String>,
    /// Deadline covering the order fetch and every store operation of one delivery.
    pub webhook_deadline: Duration,
    /// Trailing window for the most-recent-visit fallback.
    pub attribution_window_days: i64,
    pub platform: PlatformConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("ATTRIBUTION_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "attribution.db".to_string()),
            dev_mode,
            webhook_secret: non_empty_var("WEBHOOK_SECRET"),
            webhook_deadline: Duration::from_secs(parse_var("WEBHOOK_DEADLINE_SECS", 20)),
            attribution_window_days: parse_var("ATTRIBUTION_WINDOW_DAYS", 90),
            platform: PlatformConfig {
                api_base_url: env::var("PLATFORM_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_PLATFORM_API_BASE_URL.to_string()),
                store_id: non_empty_var("PLATFORM_STORE_ID"),
                access_token: non_empty_var("PLATFORM_ACCESS_TOKEN"),
                timeout: Duration::from_secs(parse_var("PLATFORM_TIMEOUT_SECS", 10)),
            },
        }
    }

    /// Reject configurations that are only acceptable during development.
    ///
    /// Without a webhook secret anyone can post order events, so outside dev
    /// mode a missing secret is a startup error rather than a silent downgrade.
    pub fn validate(&self) -> Result<()> {
        if self.webhook_secret.is_none() && !self.dev_mode {
            return Err(AppError::Config(
                "WEBHOOK_SECRET must be set outside development mode".into(),
            ));
        }
        if self.attribution_window_days <= 0 {
            return Err(AppError::Config(
                "ATTRIBUTION_WINDOW_DAYS must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
