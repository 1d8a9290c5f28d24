//! MCP tool surface
//!
//! Describes the connector's operations as Model Context Protocol tools and
//! dispatches tool invocations onto the typed facade. The host runtime owns
//! the protocol transport; this module only shapes tool metadata and turns
//! results into serialized response envelopes.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::connector::ResolvepayConnector;
use crate::error::{ConnectorError, ConnectorResult};
use crate::models::{
    CreditCheckRequest, CustomerUpdate, NewCustomer, ResponseEnvelope, SearchQuery,
};

/// One MCP tool: name, description and JSON schema of its arguments.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn customer_properties() -> Value {
    json!({
        "business_name": { "type": "string", "description": "Legal business name" },
        "business_address": { "type": "string", "description": "Street address" },
        "business_city": { "type": "string", "description": "City" },
        "business_state": { "type": "string", "description": "State/province code (e.g. NY)" },
        "business_zip": { "type": "string", "description": "ZIP/postal code" },
        "business_country": { "type": "string", "description": "2-letter ISO 3166-1 country code" },
        "business_ap_email": { "type": "string", "description": "Accounts payable email" },
        "email": { "type": "string", "description": "Primary contact email" },
        "business_ap_phone": { "type": "string", "description": "Phone in ###-###-#### format" },
        "business_ap_phone_extension": { "type": "string", "description": "Phone extension" },
        "default_terms": {
            "type": "string",
            "enum": ["net7", "net10", "net15", "net30", "net45", "net60", "net90"],
            "description": "Default payment terms"
        }
    })
}

const CUSTOMER_REQUIRED: [&str; 8] = [
    "business_name",
    "business_address",
    "business_city",
    "business_state",
    "business_zip",
    "business_country",
    "business_ap_email",
    "email",
];

/// The tools this connector exposes to an MCP host.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "create_customer",
            description: "Create a new business customer in ResolvePay with \
                          contact details and payment terms.",
            input_schema: json!({
                "type": "object",
                "properties": customer_properties(),
                "required": CUSTOMER_REQUIRED,
            }),
        },
        ToolDefinition {
            name: "get_customer",
            description: "Retrieve a customer by its ResolvePay id.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": { "type": "string", "description": "Customer id" }
                },
                "required": ["customer_id"],
            }),
        },
        ToolDefinition {
            name: "update_customer",
            description: "Update an existing customer; only provided fields change.",
            input_schema: {
                // customer_id plus every customer field, all optional on update
                let mut properties = customer_properties();
                properties["customer_id"] =
                    json!({ "type": "string", "description": "Customer id" });
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": ["customer_id"],
                })
            },
        },
        ToolDefinition {
            name: "search_customers",
            description: "Search customers by exact-match criteria; returns one \
                          page of results (limit 25-100 per page).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "email": { "type": "string", "description": "Filter by email (exact match)" },
                    "business_name": { "type": "string", "description": "Filter by business name (exact match)" },
                    "limit": { "type": "integer", "description": "Results per page (25-100)" },
                    "page": { "type": "integer", "description": "1-indexed page number" }
                },
            }),
        },
        ToolDefinition {
            name: "request_customer_credit_check",
            description: "Request a credit check for an existing customer. The \
                          customer needs a valid ###-###-#### phone number.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": { "type": "string", "description": "Customer id" },
                    "amount_requested": { "type": "number", "description": "Credit amount to request" },
                    "has_purchase_history": { "type": "boolean", "description": "Whether the customer has purchase history" }
                },
                "required": ["customer_id", "amount_requested"],
            }),
        },
        ToolDefinition {
            name: "get_credit_check_status",
            description: "Read the credit check status and amounts for a customer.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": { "type": "string", "description": "Customer id" }
                },
                "required": ["customer_id"],
            }),
        },
        ToolDefinition {
            name: "validate_customer_data",
            description: "Validate customer data locally without any API call.",
            input_schema: json!({
                "type": "object",
                "properties": customer_properties(),
                "required": CUSTOMER_REQUIRED,
            }),
        },
    ]
}

/// Invoke a tool by name and return the serialized response envelope.
pub async fn dispatch(connector: &ResolvepayConnector, tool: &str, arguments: Value) -> Value {
    debug!(tool = %tool, "Dispatching MCP tool call");
    match tool {
        "create_customer" => envelope(create_customer(connector, arguments).await),
        "get_customer" => envelope(get_customer(connector, arguments).await),
        "update_customer" => envelope(update_customer(connector, arguments).await),
        "search_customers" => envelope(search_customers(connector, arguments).await),
        "request_customer_credit_check" => {
            envelope(request_credit_check(connector, arguments).await)
        }
        "get_credit_check_status" => envelope(get_credit_check_status(connector, arguments).await),
        "validate_customer_data" => envelope(validate_customer_data(connector, &arguments)),
        other => envelope::<Value>(Err(ConnectorError::Validation(format!(
            "unknown tool: {other}"
        )))),
    }
}

fn envelope<T: Serialize>(result: ConnectorResult<T>) -> Value {
    serde_json::to_value(ResponseEnvelope::from(result))
        .unwrap_or_else(|e| json!({ "success": false, "error": { "kind": "decode", "message": e.to_string(), "retryable": false } }))
}

fn arg_str(arguments: &Value, name: &str) -> ConnectorResult<String> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::Validation(format!("{name} is required")))
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> ConnectorResult<T> {
    serde_json::from_value(arguments)
        .map_err(|e| ConnectorError::Validation(format!("invalid arguments: {e}")))
}

async fn create_customer(
    connector: &ResolvepayConnector,
    arguments: Value,
) -> ConnectorResult<crate::models::Customer> {
    let customer: NewCustomer = parse_args(arguments)?;
    connector.create_customer(customer).await
}

async fn get_customer(
    connector: &ResolvepayConnector,
    arguments: Value,
) -> ConnectorResult<crate::models::Customer> {
    let customer_id = arg_str(&arguments, "customer_id")?;
    connector.get_customer(&customer_id).await
}

async fn update_customer(
    connector: &ResolvepayConnector,
    mut arguments: Value,
) -> ConnectorResult<crate::models::Customer> {
    let customer_id = arg_str(&arguments, "customer_id")?;
    if let Some(object) = arguments.as_object_mut() {
        object.remove("customer_id");
    }
    let update: CustomerUpdate = parse_args(arguments)?;
    connector.update_customer(&customer_id, update).await
}

async fn search_customers(
    connector: &ResolvepayConnector,
    arguments: Value,
) -> ConnectorResult<crate::models::CustomerPage> {
    let query: SearchQuery = parse_args(arguments)?;
    let mut search = connector.search_customers(query);
    let page = search.next_page().await?;
    // An out-of-range page still yields a well-formed empty page
    Ok(page.unwrap_or(crate::models::CustomerPage {
        customers: Vec::new(),
        total: 0,
        page: 1,
        limit: 25,
        has_more: false,
    }))
}

async fn request_credit_check(
    connector: &ResolvepayConnector,
    arguments: Value,
) -> ConnectorResult<crate::models::CreditCheckResult> {
    let customer_id = arg_str(&arguments, "customer_id")?;
    let amount_requested = arguments
        .get("amount_requested")
        .and_then(Value::as_f64)
        .ok_or_else(|| ConnectorError::Validation("amount_requested is required".to_string()))?;
    let has_purchase_history = arguments
        .get("has_purchase_history")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    connector
        .request_credit_check(
            &customer_id,
            CreditCheckRequest {
                amount_requested,
                has_purchase_history,
            },
        )
        .await
}

async fn get_credit_check_status(
    connector: &ResolvepayConnector,
    arguments: Value,
) -> ConnectorResult<crate::models::CreditCheckResult> {
    let customer_id = arg_str(&arguments, "customer_id")?;
    connector.get_credit_check_status(&customer_id).await
}

fn validate_customer_data(
    connector: &ResolvepayConnector,
    arguments: &Value,
) -> ConnectorResult<Value> {
    let customer: NewCustomer = parse_args(arguments.clone())?;
    // Validation failures are reported in-band, not as tool errors
    Ok(match connector.validate_customer_data(&customer) {
        Ok(()) => json!({ "valid": true }),
        Err(e) => json!({ "valid": false, "error": e.to_string() }),
    })
}
