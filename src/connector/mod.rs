//! ResolvePay connector facade
//!
//! One typed method per API operation. Every network method validates its
//! input locally first (invalid input never consumes a rate-limit token),
//! then acquires a limiter token, builds a [`RequestSpec`] and delegates to
//! the transport. The configured timeout bounds the whole acquire+send
//! sequence, not just the network leg.

use std::sync::Arc;

use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::AuthProvider;
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, ConnectorResult};
use crate::http::{HttpTransport, RequestSpec, Transport};
use crate::limiter::RateLimiter;
use crate::models::{
    CreditCheckRequest, CreditCheckResult, Customer, CustomerPage, CustomerUpdate, NewCustomer,
    SearchQuery, SearchResponse,
};
use crate::validate;

/// Typed, rate-limited client for the ResolvePay API.
///
/// Each instance owns its own configuration, credentials and limiter state;
/// it is safe to share behind an `Arc` across concurrent callers.
pub struct ResolvepayConnector {
    config: ConnectorConfig,
    limiter: RateLimiter,
    transport: Arc<dyn Transport>,
}

impl ResolvepayConnector {
    /// Build a connector with the production HTTPS transport.
    pub fn new(config: ConnectorConfig) -> ConnectorResult<Self> {
        config.validate()?;
        let auth = AuthProvider::new(&config.merchant_id, &config.api_key)?;
        let transport = Arc::new(HttpTransport::new(&config, auth)?);
        Self::with_transport(config, transport)
    }

    /// Build a connector over a caller-supplied transport (test seam).
    pub fn with_transport(
        config: ConnectorConfig,
        transport: Arc<dyn Transport>,
    ) -> ConnectorResult<Self> {
        config.validate()?;
        let limiter = RateLimiter::new(config.rate_limit_calls_per_second)?;
        info!(
            base_url = %config.base_url,
            rate_limit = config.rate_limit_calls_per_second,
            max_retries = config.max_retries,
            "ResolvePay connector initialized"
        );
        Ok(ResolvepayConnector {
            config,
            limiter,
            transport,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Rate-limit tokens currently available.
    pub async fn rate_limit_remaining(&self) -> f64 {
        self.limiter.available().await
    }

    /// Acquire a limiter token and perform the request, bounded by the
    /// per-call (or configured) timeout end to end.
    async fn execute(&self, spec: RequestSpec) -> ConnectorResult<Value> {
        let overall = spec.timeout.unwrap_or_else(|| self.config.timeout());
        match tokio::time::timeout(overall, async {
            self.limiter.acquire().await;
            self.transport.send(&spec).await
        })
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::Transport(format!(
                "operation timed out after {}s (including rate-limit wait)",
                overall.as_secs()
            ))),
        }
    }

    /// Create a new business customer.
    pub async fn create_customer(&self, customer: NewCustomer) -> ConnectorResult<Customer> {
        let customer = customer.normalized();
        validate::validate_new_customer(&customer)?;

        debug!(business_name = %customer.business_name, "Creating customer");
        let body = self
            .execute(RequestSpec::post("customers", serde_json::to_value(&customer)?))
            .await?;

        let created: Customer = serde_json::from_value(body)?;
        info!(customer_id = %created.id, "Customer created");
        Ok(created)
    }

    /// Retrieve a customer by id.
    pub async fn get_customer(&self, customer_id: &str) -> ConnectorResult<Customer> {
        let customer_id = require_customer_id(customer_id)?;

        debug!(customer_id = %customer_id, "Fetching customer");
        let body = self
            .execute(RequestSpec::get(format!("customers/{customer_id}")))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Update an existing customer; only provided fields are sent.
    pub async fn update_customer(
        &self,
        customer_id: &str,
        update: CustomerUpdate,
    ) -> ConnectorResult<Customer> {
        let customer_id = require_customer_id(customer_id)?;
        let update = update.normalized();
        if update.is_empty() {
            return Err(ConnectorError::Validation(
                "Update must set at least one field".to_string(),
            ));
        }
        validate::validate_customer_update(&update)?;

        debug!(customer_id = %customer_id, "Updating customer");
        let body = self
            .execute(RequestSpec::put(
                format!("customers/{customer_id}"),
                serde_json::to_value(&update)?,
            ))
            .await?;

        let updated: Customer = serde_json::from_value(body)?;
        info!(customer_id = %updated.id, "Customer updated");
        Ok(updated)
    }

    /// Lazy, restartable search over customers. Pages are fetched on demand
    /// as the result is iterated.
    pub fn search_customers(&self, query: SearchQuery) -> CustomerSearch<'_> {
        CustomerSearch::new(self, query)
    }

    /// Request a credit check for an existing customer.
    ///
    /// The customer must carry a valid `###-###-####` phone number for the
    /// check to succeed remotely.
    pub async fn request_credit_check(
        &self,
        customer_id: &str,
        request: CreditCheckRequest,
    ) -> ConnectorResult<CreditCheckResult> {
        let customer_id = require_customer_id(customer_id)?;
        if !request.amount_requested.is_finite() || request.amount_requested <= 0.0 {
            return Err(ConnectorError::Validation(
                "amount_requested must be a positive number".to_string(),
            ));
        }

        debug!(customer_id = %customer_id, amount = request.amount_requested, "Requesting credit check");
        let body = self
            .execute(RequestSpec::post(
                format!("customers/{customer_id}/credit-check"),
                serde_json::to_value(&request)?,
            ))
            .await?;

        let mut result: CreditCheckResult = serde_json::from_value(body)?;
        if result.customer_id.is_empty() {
            // Some responses omit the id; callers still get it back
            result.customer_id = customer_id.to_string();
        }
        info!(customer_id = %result.customer_id, status = ?result.status, "Credit check requested");
        Ok(result)
    }

    /// Read the current credit check state for a customer.
    ///
    /// ResolvePay exposes no dedicated retrieval endpoint; the state lives
    /// on the customer record and is projected from there.
    pub async fn get_credit_check_status(
        &self,
        customer_id: &str,
    ) -> ConnectorResult<CreditCheckResult> {
        let customer = self.get_customer(customer_id).await?;
        Ok(CreditCheckResult::from_customer(&customer))
    }

    /// Validate a customer payload locally. Never touches the network and
    /// never consumes a rate-limit token.
    pub fn validate_customer_data(&self, customer: &NewCustomer) -> ConnectorResult<()> {
        validate::validate_new_customer(customer)
    }
}

fn require_customer_id(customer_id: &str) -> ConnectorResult<&str> {
    let trimmed = customer_id.trim();
    if trimmed.is_empty() {
        return Err(ConnectorError::Validation(
            "customer_id is required".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Lazy cursor over paginated customer search results.
///
/// Fetches the next page transparently on iteration and stops when the
/// remote signals no further pages. `restart` rewinds to the starting page.
pub struct CustomerSearch<'a> {
    connector: &'a ResolvepayConnector,
    query: SearchQuery,
    cursor: Option<u32>,
}

impl<'a> CustomerSearch<'a> {
    fn new(connector: &'a ResolvepayConnector, query: SearchQuery) -> Self {
        let start = query.page.unwrap_or(1).max(1);
        CustomerSearch {
            connector,
            query,
            cursor: Some(start),
        }
    }

    /// Rewind to the starting page; the next fetch re-queries from there.
    pub fn restart(&mut self) {
        self.cursor = Some(self.query.page.unwrap_or(1).max(1));
    }

    /// Fetch the next page, or `None` once the remote reports the end.
    pub async fn next_page(&mut self) -> ConnectorResult<Option<CustomerPage>> {
        let Some(page) = self.cursor else {
            return Ok(None);
        };
        let limit = self.query.effective_limit();

        let mut spec = RequestSpec::get("customers")
            .with_query("page", page.to_string())
            .with_query("limit", limit.to_string());
        if let Some(email) = &self.query.email {
            spec = spec.with_query("filter[email][eq]", email.clone());
        }
        if let Some(name) = &self.query.business_name {
            spec = spec.with_query("filter[business_name][eq]", name.clone());
        }

        let body = self.connector.execute(spec).await?;
        let response: SearchResponse = serde_json::from_value(body)?;
        let result = response.into_page(page, limit);

        self.cursor = if result.has_more {
            Some(result.page + 1)
        } else {
            None
        };
        debug!(
            page = result.page,
            returned = result.customers.len(),
            total = result.total,
            has_more = result.has_more,
            "Search page fetched"
        );
        Ok(Some(result))
    }

    /// Flatten the remaining pages into a stream of customers.
    pub fn customers(self) -> impl Stream<Item = ConnectorResult<Customer>> + 'a {
        stream::try_unfold(self, |mut search| async move {
            Ok::<_, ConnectorError>(
                search
                    .next_page()
                    .await?
                    .map(|page| {
                        let items = page.customers.into_iter().map(Ok::<_, ConnectorError>);
                        (stream::iter(items), search)
                    }),
            )
        })
        .try_flatten()
    }
}
