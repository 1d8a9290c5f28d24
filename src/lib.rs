//! resolvepay-connector
//!
//! Typed, rate-limited async client for the ResolvePay payment and
//! credit-check API, built for embedding in an MCP (Model Context Protocol)
//! host runtime.
//!
//! The connector mediates HTTPS/JSON calls to ResolvePay: it constructs the
//! Basic auth header from merchant credentials, throttles outbound calls
//! through a token bucket, retries transient failures with exponential
//! backoff, and shapes responses into typed models or typed errors.
//!
//! ```no_run
//! use resolvepay_connector::{ConnectorConfig, NewCustomer, ResolvepayConnector};
//!
//! # async fn example() -> Result<(), resolvepay_connector::ConnectorError> {
//! let config = ConnectorConfig::new("merchant_id", "api_key");
//! let connector = ResolvepayConnector::new(config)?;
//!
//! let customer = connector
//!     .create_customer(NewCustomer {
//!         business_name: "Acme Corp".into(),
//!         business_address: "123 Main St".into(),
//!         business_city: "New York".into(),
//!         business_state: "NY".into(),
//!         business_zip: "10001".into(),
//!         business_country: "US".into(),
//!         business_ap_email: "ap@acme.com".into(),
//!         email: "contact@acme.com".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("created customer {}", customer.id);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod http;
pub mod limiter;
pub mod mcp;
pub mod models;
pub mod validate;

pub use auth::AuthProvider;
pub use config::ConnectorConfig;
pub use connector::{CustomerSearch, ResolvepayConnector};
pub use error::{ConnectorError, ConnectorResult, ErrorDetail, ErrorKind};
pub use http::{HttpTransport, RequestSpec, Transport};
pub use limiter::RateLimiter;
pub use models::{
    CreditCheckRequest, CreditCheckResult, CreditCheckStatus, Customer, CustomerPage,
    CustomerUpdate, NewCustomer, PaymentTerms, ResponseEnvelope, SearchQuery,
};
