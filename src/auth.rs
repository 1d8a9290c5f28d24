//! Authentication header construction
//!
//! ResolvePay authenticates with HTTP Basic auth over the merchant id and
//! API key. The provider is a pure function of the stored credentials: no
//! network, no mutable state, and the raw key never reaches the logs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::error::{ConnectorError, ConnectorResult};

/// Header names applied to every request
pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ACCEPT: &str = "Accept";

/// Holds merchant credentials and derives the auth header value.
#[derive(Clone)]
pub struct AuthProvider {
    merchant_id: String,
    api_key: String,
}

impl AuthProvider {
    pub fn new(merchant_id: &str, api_key: &str) -> ConnectorResult<Self> {
        if merchant_id.trim().is_empty() {
            return Err(ConnectorError::Configuration(
                "merchant_id is required for authentication".to_string(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(ConnectorError::Configuration(
                "api_key is required for authentication".to_string(),
            ));
        }

        Ok(AuthProvider {
            merchant_id: merchant_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `Basic base64(merchant_id:api_key)`
    pub fn authorization_value(&self) -> String {
        let raw = format!("{}:{}", self.merchant_id, self.api_key);
        format!("Basic {}", BASE64.encode(raw))
    }

    /// Full header set for an API request.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            (AUTHORIZATION, self.authorization_value()),
            (CONTENT_TYPE, "application/json".to_string()),
            (ACCEPT, "application/json".to_string()),
        ]
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Truncated key form, safe to log.
    pub fn redacted_key(&self) -> String {
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}***")
    }

    /// Emit a redacted diagnostic line (used when debug mode is on).
    pub fn log_debug(&self) {
        debug!(
            merchant_id = %self.merchant_id,
            api_key = %self.redacted_key(),
            "Auth provider configured"
        );
    }
}

// Manual Debug so credentials cannot leak through {:?} formatting.
impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProvider")
            .field("merchant_id", &self.merchant_id)
            .field("api_key", &self.redacted_key())
            .finish()
    }
}
