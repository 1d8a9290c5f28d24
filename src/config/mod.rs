//! Configuration module for the ResolvePay connector

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;
use url::Url;

use crate::error::{ConnectorError, ConnectorResult};

const DEFAULT_BASE_URL: &str = "https://api.resolvepay.com/v5";

/// Connector settings, loaded once at construction and immutable for the
/// connector's lifetime. Each connector instance owns its own copy.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    pub merchant_id: String,
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Overall per-call timeout in seconds (covers limiter wait + network)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after the first request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_rate_limit")]
    pub rate_limit_calls_per_second: f64,

    /// Base delay for exponential backoff between retries
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Enables verbose diagnostic logging (secrets stay redacted)
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit() -> f64 {
    10.0
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

impl ConnectorConfig {
    /// Config with defaults for everything except credentials.
    pub fn new(merchant_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        ConnectorConfig {
            merchant_id: merchant_id.into(),
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            rate_limit_calls_per_second: default_rate_limit(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            debug_mode: false,
        }
    }

    /// Load configuration from environment variables
    /// (`RESOLVEPAY_MERCHANT_ID`, `RESOLVEPAY_API_KEY`, `RESOLVEPAY_BASE_URL`, ...).
    pub fn load() -> ConnectorResult<Self> {
        let settings: ConnectorConfig = Config::builder()
            .add_source(Environment::with_prefix("RESOLVEPAY").try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| ConnectorError::Configuration(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject configurations the connector cannot run with.
    pub fn validate(&self) -> ConnectorResult<()> {
        if self.merchant_id.trim().is_empty() {
            return Err(ConnectorError::Configuration(
                "merchant_id is required".to_string(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConnectorError::Configuration(
                "api_key is required".to_string(),
            ));
        }
        if !self.rate_limit_calls_per_second.is_finite() || self.rate_limit_calls_per_second <= 0.0
        {
            return Err(ConnectorError::Configuration(format!(
                "rate_limit_calls_per_second must be positive, got {}",
                self.rate_limit_calls_per_second
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConnectorError::Configuration(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Url::parse(&self.base_url)
            .map_err(|e| ConnectorError::Configuration(format!("invalid base_url: {e}")))?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
