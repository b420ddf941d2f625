//! Environment-sourced configuration, read once at startup.

use std::env;

use tap_checkout::TapConfig;
use url::Url;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_RATE_LIMIT_RPM: u64 = 120;

/// Process-wide configuration for the checkout server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Tap REST base, e.g. `https://api.tap.company/v2`.
    pub tap_api_base: String,
    /// Tap secret credential.
    pub tap_secret_key: String,
    /// Merchant identifier.
    pub tap_merchant_id: String,
    /// Public-facing base used to build the 3-D-Secure return link.
    pub web_base_url: String,
    /// CORS allowed origins.
    pub allowed_origins: Vec<String>,
    /// Listen port.
    pub port: u16,
    /// Rate limit requests per minute per IP.
    pub rate_limit_rpm: u64,
    /// Webhook signature secret (`None` = log-only webhooks).
    pub webhook_secret: Option<Vec<u8>>,
    /// Bearer token required for /metrics (`None` = public).
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("tap_api_base", &self.tap_api_base)
            .field("tap_secret_key", &"[REDACTED]")
            .field("tap_merchant_id", &self.tap_merchant_id)
            .field("web_base_url", &self.web_base_url)
            .field("allowed_origins", &self.allowed_origins)
            .field("port", &self.port)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let tap_api_base = require("TAP_API_BASE")?;
        Url::parse(&tap_api_base).map_err(|_| ConfigError::InvalidUrl(tap_api_base.clone()))?;

        let tap_secret_key = require("TAP_SECRET_KEY")?;
        let tap_merchant_id = require("TAP_MERCHANT_ID")?;

        let web_base_url = require("WEB_BASE_URL")?;
        Url::parse(&web_base_url).map_err(|_| ConfigError::InvalidUrl(web_base_url.clone()))?;

        let allowed_origins: Vec<String> = env::var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        let webhook_secret = env::var("TAP_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .map(String::into_bytes);
        if webhook_secret.is_none() {
            tracing::warn!(
                "TAP_WEBHOOK_SECRET not set — webhook signatures will not be verified; \
                 events are logged only and never acted upon"
            );
        }

        let metrics_token = env::var("METRICS_TOKEN").ok().filter(|s| !s.is_empty());
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set — /metrics endpoint is publicly accessible");
        }

        Ok(Self {
            tap_api_base,
            tap_secret_key,
            tap_merchant_id,
            web_base_url,
            allowed_origins,
            port,
            rate_limit_rpm,
            webhook_secret,
            metrics_token,
        })
    }

    /// The gateway-facing slice of this configuration.
    pub fn tap_config(&self) -> TapConfig {
        TapConfig::new(
            self.tap_api_base.clone(),
            self.tap_secret_key.clone(),
            self.tap_merchant_id.clone(),
        )
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingRequired(name))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
