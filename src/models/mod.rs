//! ResolvePay API data models
//!
//! These models mirror the JSON bodies the ResolvePay v5 API sends and
//! receives. Optional request fields are skipped during serialization so the
//! remote only sees what the caller actually provided.

use serde::{Deserialize, Serialize};

use crate::error::{ConnectorError, ErrorDetail};

// ============================================================================
// Enums
// ============================================================================

/// Available payment terms for customers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentTerms {
    Net7,
    Net10,
    Net15,
    Net30,
    Net45,
    Net60,
    Net90,
}

/// Credit check status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditCheckStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Approved,
    Denied,
}

impl Default for CreditCheckStatus {
    // The API omits the status while a check has not started yet
    fn default() -> Self {
        CreditCheckStatus::Pending
    }
}

// ============================================================================
// Customers
// ============================================================================

/// Request body for creating a customer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCustomer {
    pub business_name: String,
    pub business_address: String,
    pub business_city: String,
    pub business_state: String,
    pub business_zip: String,
    pub business_country: String,
    pub business_ap_email: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_ap_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_ap_phone_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_terms: Option<PaymentTerms>,
}

impl NewCustomer {
    /// Trim free-text fields, uppercase state/country, lowercase emails.
    pub fn normalized(mut self) -> Self {
        self.business_name = self.business_name.trim().to_string();
        self.business_address = self.business_address.trim().to_string();
        self.business_city = self.business_city.trim().to_string();
        self.business_state = self.business_state.trim().to_uppercase();
        self.business_zip = self.business_zip.trim().to_string();
        self.business_country = self.business_country.trim().to_uppercase();
        self.business_ap_email = self.business_ap_email.trim().to_lowercase();
        self.email = self.email.trim().to_lowercase();
        self
    }
}

/// Request body for updating a customer; only provided fields are sent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_ap_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_ap_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_ap_phone_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_terms: Option<PaymentTerms>,
}

impl CustomerUpdate {
    pub fn normalized(mut self) -> Self {
        self.business_name = self.business_name.map(|v| v.trim().to_string());
        self.business_address = self.business_address.map(|v| v.trim().to_string());
        self.business_city = self.business_city.map(|v| v.trim().to_string());
        self.business_state = self.business_state.map(|v| v.trim().to_uppercase());
        self.business_zip = self.business_zip.map(|v| v.trim().to_string());
        self.business_country = self.business_country.map(|v| v.trim().to_uppercase());
        self.business_ap_email = self.business_ap_email.map(|v| v.trim().to_lowercase());
        self.email = self.email.map(|v| v.trim().to_lowercase());
        self
    }

    /// True when no field is set, so there is nothing to send.
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().map(|o| o.is_empty()).unwrap_or(true))
            .unwrap_or(true)
    }
}

/// Customer record as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub business_name: String,
    pub business_address: String,
    pub business_city: String,
    pub business_state: String,
    pub business_zip: String,
    pub business_country: String,
    pub business_ap_email: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub amount_approved: Option<f64>,
    #[serde(default)]
    pub amount_available: Option<f64>,
    #[serde(default)]
    pub credit_limit: Option<f64>,
    #[serde(default)]
    pub business_ap_phone: Option<String>,
    #[serde(default)]
    pub business_ap_phone_extension: Option<String>,
    #[serde(default)]
    pub default_terms: Option<String>,
    #[serde(default)]
    pub credit_status: Option<String>,
    #[serde(default)]
    pub credit_check_requested_at: Option<String>,
}

// ============================================================================
// Credit checks
// ============================================================================

/// Request body for `POST customers/{id}/credit-check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCheckRequest {
    pub amount_requested: f64,
    #[serde(default)]
    pub has_purchase_history: bool,
}

impl CreditCheckRequest {
    pub fn new(amount_requested: f64) -> Self {
        CreditCheckRequest {
            amount_requested,
            has_purchase_history: false,
        }
    }
}

/// Credit check outcome, either from the credit-check endpoint or projected
/// from the customer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCheckResult {
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub status: CreditCheckStatus,
    #[serde(default)]
    pub amount_approved: Option<f64>,
    #[serde(default)]
    pub amount_available: Option<f64>,
    #[serde(default)]
    pub credit_limit: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreditCheckResult {
    /// Project the credit fields out of a customer record. ResolvePay has no
    /// dedicated retrieval endpoint; the customer object carries the state.
    pub fn from_customer(customer: &Customer) -> Self {
        let status = customer
            .credit_status
            .as_deref()
            .and_then(|s| serde_json::from_value(serde_json::Value::String(s.to_string())).ok())
            .unwrap_or_default();

        CreditCheckResult {
            customer_id: customer.id.clone(),
            status,
            amount_approved: customer.amount_approved,
            amount_available: customer.amount_available,
            credit_limit: customer.credit_limit,
            created_at: customer.credit_check_requested_at.clone(),
            updated_at: Some(customer.updated_at.clone()),
            notes: None,
        }
    }
}

// ============================================================================
// Search / pagination
// ============================================================================

/// Search criteria for customer lookups (exact-match filters)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub email: Option<String>,
    pub business_name: Option<String>,
    /// Page size; the API requires 25..=100
    pub limit: Option<u32>,
    /// 1-indexed starting page
    pub page: Option<u32>,
}

impl SearchQuery {
    pub fn by_email(email: impl Into<String>) -> Self {
        SearchQuery {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn by_business_name(name: impl Into<String>) -> Self {
        SearchQuery {
            business_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Page size clamped to the range the API accepts.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(25).clamp(25, 100)
    }
}

/// One page of customer search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

/// Wire shape of `GET customers` responses
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Customer>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchResponse {
    pub fn into_page(self, requested_page: u32, requested_limit: u32) -> CustomerPage {
        let page = self.page.unwrap_or(requested_page);
        let limit = self.limit.unwrap_or(requested_limit);
        let total = self.count.unwrap_or(self.results.len() as u64);
        let has_more =
            !self.results.is_empty() && (u64::from(page) * u64::from(limit)) < total;

        CustomerPage {
            customers: self.results,
            total,
            page,
            limit,
            has_more,
        }
    }
}

// ============================================================================
// Response envelope
// ============================================================================

/// Uniform wrapper returned to the MCP host: success flag plus either the
/// typed payload or a structured error
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        ResponseEnvelope {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &ConnectorError) -> Self {
        ResponseEnvelope {
            success: false,
            data: None,
            error: Some(error.detail()),
        }
    }
}

impl<T> From<Result<T, ConnectorError>> for ResponseEnvelope<T> {
    fn from(result: Result<T, ConnectorError>) -> Self {
        match result {
            Ok(data) => ResponseEnvelope::ok(data),
            Err(e) => ResponseEnvelope::err(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_payment_terms_wire_form() {
        assert_eq!(
            serde_json::to_value(PaymentTerms::Net30).unwrap(),
            json!("net30")
        );
        let parsed: PaymentTerms = serde_json::from_value(json!("net90")).unwrap();
        assert_eq!(parsed, PaymentTerms::Net90);
    }

    #[test]
    fn test_credit_status_defaults_to_pending() {
        let result: CreditCheckResult =
            serde_json::from_value(json!({ "customer_id": "cust_1" })).unwrap();
        assert_eq!(result.status, CreditCheckStatus::Pending);
    }

    #[test]
    fn test_in_progress_wire_form() {
        let parsed: CreditCheckStatus = serde_json::from_value(json!("in_progress")).unwrap();
        assert_eq!(parsed, CreditCheckStatus::InProgress);
    }

    #[test]
    fn test_new_customer_skips_absent_optionals() {
        let customer = NewCustomer {
            business_name: "Acme Corp".into(),
            business_address: "123 Main St".into(),
            business_city: "New York".into(),
            business_state: "NY".into(),
            business_zip: "10001".into(),
            business_country: "US".into(),
            business_ap_email: "ap@acme.com".into(),
            email: "contact@acme.com".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&customer).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("business_ap_phone"));
        assert!(!object.contains_key("default_terms"));
        assert_eq!(object.len(), 8);
    }

    #[test]
    fn test_normalization() {
        let customer = NewCustomer {
            business_name: "  Acme Corp  ".into(),
            business_state: "ny".into(),
            business_country: "us".into(),
            email: " Contact@Acme.COM ".into(),
            business_ap_email: "AP@acme.com".into(),
            ..Default::default()
        }
        .normalized();
        assert_eq!(customer.business_name, "Acme Corp");
        assert_eq!(customer.business_state, "NY");
        assert_eq!(customer.business_country, "US");
        assert_eq!(customer.email, "contact@acme.com");
        assert_eq!(customer.business_ap_email, "ap@acme.com");
    }

    #[test]
    fn test_update_is_empty() {
        assert!(CustomerUpdate::default().is_empty());
        let update = CustomerUpdate {
            email: Some("a@b.co".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_search_limit_clamped() {
        assert_eq!(SearchQuery::default().effective_limit(), 25);
        let mut query = SearchQuery::default();
        query.limit = Some(10);
        assert_eq!(query.effective_limit(), 25);
        query.limit = Some(500);
        assert_eq!(query.effective_limit(), 100);
        query.limit = Some(50);
        assert_eq!(query.effective_limit(), 50);
    }

    #[test]
    fn test_search_response_has_more() {
        let response = SearchResponse {
            results: vec![],
            count: Some(100),
            page: Some(1),
            limit: Some(25),
        };
        // Empty page always terminates, whatever the count claims
        assert!(!response.into_page(1, 25).has_more);

        let customer: Customer = serde_json::from_value(sample_customer_json()).unwrap();
        let response = SearchResponse {
            results: vec![customer.clone()],
            count: Some(3),
            page: Some(1),
            limit: Some(1),
        };
        assert!(response.into_page(1, 1).has_more);

        let response = SearchResponse {
            results: vec![customer],
            count: Some(3),
            page: Some(3),
            limit: Some(1),
        };
        assert!(!response.into_page(3, 1).has_more);
    }

    #[test]
    fn test_envelope_shapes() {
        let ok: ResponseEnvelope<i32> = ResponseEnvelope::from(Ok(5));
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value, json!({ "success": true, "data": 5 }));

        let err: ResponseEnvelope<i32> =
            ResponseEnvelope::from(Err(ConnectorError::NotFound("cust_1".into())));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"]["kind"], json!("not_found"));
        assert_eq!(value["error"]["retryable"], json!(false));
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_credit_result_from_customer() {
        let mut customer: Customer = serde_json::from_value(sample_customer_json()).unwrap();
        customer.credit_status = Some("approved".into());
        customer.amount_approved = Some(5000.0);
        customer.credit_check_requested_at = Some("2024-01-02T00:00:00Z".into());

        let result = CreditCheckResult::from_customer(&customer);
        assert_eq!(result.customer_id, "cust_1");
        assert_eq!(result.status, CreditCheckStatus::Approved);
        assert_eq!(result.amount_approved, Some(5000.0));
        assert_eq!(result.created_at.as_deref(), Some("2024-01-02T00:00:00Z"));
    }

    pub(crate) fn sample_customer_json() -> serde_json::Value {
        json!({
            "id": "cust_1",
            "business_name": "Acme Corp",
            "business_address": "123 Main St",
            "business_city": "New York",
            "business_state": "NY",
            "business_zip": "10001",
            "business_country": "US",
            "business_ap_email": "ap@acme.com",
            "email": "contact@acme.com",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}
