//! End-to-end connector behavior against a mock ResolvePay server.

use std::time::{Duration, Instant};

use futures::TryStreamExt;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use resolvepay_connector::{
    ConnectorConfig, CreditCheckRequest, CreditCheckStatus, ErrorKind, NewCustomer,
    ResolvepayConnector, SearchQuery,
};

fn test_config(server: &MockServer) -> ConnectorConfig {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut config = ConnectorConfig::new("merchant_test", "key_test");
    config.base_url = format!("{}/v5", server.uri());
    config.rate_limit_calls_per_second = 1000.0;
    config.retry_base_delay_ms = 10;
    config
}

fn connector(server: &MockServer) -> ResolvepayConnector {
    ResolvepayConnector::new(test_config(server)).unwrap()
}

fn acme_customer() -> NewCustomer {
    NewCustomer {
        business_name: "Acme Corp".into(),
        business_address: "123 Main St".into(),
        business_city: "New York".into(),
        business_state: "NY".into(),
        business_zip: "10001".into(),
        business_country: "US".into(),
        business_ap_email: "ap@acme.com".into(),
        email: "contact@acme.com".into(),
        ..Default::default()
    }
}

fn customer_body(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "business_name": "Acme Corp",
        "business_address": "123 Main St",
        "business_city": "New York",
        "business_state": "NY",
        "business_zip": "10001",
        "business_country": "US",
        "business_ap_email": "ap@acme.com",
        "email": "contact@acme.com",
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-02T11:00:00Z",
        "amount_approved": 5000.0,
        "credit_status": "approved"
    })
}

#[tokio::test]
async fn create_customer_roundtrips_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/customers"))
        // merchant_test:key_test, Basic scheme
        .and(header(
            "Authorization",
            "Basic bWVyY2hhbnRfdGVzdDprZXlfdGVzdA==",
        ))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_body("cust_100")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let created = connector.create_customer(acme_customer()).await.unwrap();

    assert_eq!(created.id, "cust_100");
    assert_eq!(created.business_name, "Acme Corp");
    assert_eq!(created.business_zip, "10001");
    assert_eq!(created.created_at, "2024-03-01T10:00:00Z");
    assert_eq!(created.updated_at, "2024-03-02T11:00:00Z");
    assert_eq!(created.amount_approved, Some(5000.0));
    assert_eq!(created.credit_status.as_deref(), Some("approved"));
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_body("cust_1")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let start = Instant::now();
    let customer = connector.get_customer("cust_1").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(customer.id, "cust_1");
    // Two backoff pauses (10ms, then 20ms) must have happened
    assert!(
        elapsed >= Duration::from_millis(30),
        "expected at least 30ms of backoff, got {elapsed:?}"
    );
}

#[tokio::test]
async fn retries_exhausted_surfaces_last_cause() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.max_retries = 2;
    let connector = ResolvepayConnector::new(config).unwrap();

    let err = connector.get_customer("cust_1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn not_found_fails_immediately_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Resource not found" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let err = connector.get_customer("cust_missing").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unlisted_client_error_fails_immediately_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(410).set_body_json(json!({ "message": "Gone" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.max_retries = 2;
    let connector = ResolvepayConnector::new(config).unwrap();

    let err = connector.get_customer("cust_1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedStatus);
    assert!(!err.is_retryable());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn remote_validation_error_carries_field_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/customers"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Validation failed",
                "details": [{ "path": "business_zip", "message": "is invalid" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let err = connector.create_customer(acme_customer()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("business_zip: is invalid"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn rate_limited_response_retried_after_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_body("cust_1")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let customer = connector.get_customer("cust_1").await.unwrap();
    assert_eq!(customer.id, "cust_1");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error_with_no_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let err = connector.get_customer("cust_1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(!err.is_retryable());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn auth_failure_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let err = connector.get_customer("cust_1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn invalid_payload_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_body("cust_1")))
        .expect(0)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let mut customer = acme_customer();
    customer.business_name = String::new();

    let err = connector.create_customer(customer).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_streams_all_pages_in_order() {
    let server = MockServer::start().await;

    let page = |ids: &[&str], page_no: u32| {
        json!({
            "results": ids.iter().map(|id| customer_body(id)).collect::<Vec<_>>(),
            "count": 5,
            "page": page_no,
            "limit": 2
        })
    };

    Mock::given(method("GET"))
        .and(path("/v5/customers"))
        .and(query_param("page", "1"))
        .and(query_param("filter[email][eq]", "contact@acme.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["a", "b"], 1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/customers"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["c", "d"], 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/customers"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&["e"], 3)))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);
    let ids: Vec<String> = connector
        .search_customers(SearchQuery::by_email("contact@acme.com"))
        .customers()
        .map_ok(|c| c.id)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn credit_check_request_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v5/customers/cust_1/credit-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customer_id": "cust_1",
            "status": "in_progress"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_body("cust_1")))
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(&server);

    let requested = connector
        .request_credit_check("cust_1", CreditCheckRequest::new(10_000.0))
        .await
        .unwrap();
    assert_eq!(requested.customer_id, "cust_1");
    assert_eq!(requested.status, CreditCheckStatus::InProgress);

    // Status is projected from the customer record
    let status = connector.get_credit_check_status("cust_1").await.unwrap();
    assert_eq!(status.status, CreditCheckStatus::Approved);
    assert_eq!(status.amount_approved, Some(5000.0));
}

#[tokio::test]
async fn sustained_calls_are_throttled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v5/customers/cust_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_body("cust_1")))
        .expect(6)
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.rate_limit_calls_per_second = 5.0;
    let connector = ResolvepayConnector::new(config).unwrap();

    let start = Instant::now();
    for _ in 0..6 {
        connector.get_customer("cust_1").await.unwrap();
    }
    let elapsed = start.elapsed();

    // capacity 5, rate 5/s: the sixth call waits at least (6 - 5) / 5 = 200ms
    assert!(
        elapsed >= Duration::from_millis(200),
        "expected throttling of at least 200ms, got {elapsed:?}"
    );
}
