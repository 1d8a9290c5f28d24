//! Local validation of customer payloads
//!
//! These checks run before any network call so bad input fails fast without
//! consuming a rate-limit token. The rules mirror what the ResolvePay API
//! enforces server-side: required fields, 2-letter ISO country codes, and
//! `###-###-####` phone numbers.

use tracing::warn;

use crate::error::{ConnectorError, ConnectorResult};
use crate::models::{CustomerUpdate, NewCustomer};

pub(crate) fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub(crate) fn is_valid_country_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Exactly `###-###-####`.
pub(crate) fn is_valid_phone(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    if bytes.len() != 12 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        3 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

/// Validate a creation payload: all required fields present and well formed.
pub fn validate_new_customer(customer: &NewCustomer) -> ConnectorResult<()> {
    let required = [
        ("business_name", &customer.business_name),
        ("business_address", &customer.business_address),
        ("business_city", &customer.business_city),
        ("business_state", &customer.business_state),
        ("business_zip", &customer.business_zip),
        ("business_country", &customer.business_country),
        ("business_ap_email", &customer.business_ap_email),
        ("email", &customer.email),
    ];

    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(ConnectorError::Validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    check_formats(
        Some(&customer.business_country),
        Some(&customer.email),
        Some(&customer.business_ap_email),
        customer.business_ap_phone.as_deref(),
    )
}

/// Validate an update payload: only provided fields are checked.
pub fn validate_customer_update(update: &CustomerUpdate) -> ConnectorResult<()> {
    check_formats(
        update.business_country.as_deref(),
        update.email.as_deref(),
        update.business_ap_email.as_deref(),
        update.business_ap_phone.as_deref(),
    )
}

fn check_formats(
    country: Option<&str>,
    email: Option<&str>,
    ap_email: Option<&str>,
    phone: Option<&str>,
) -> ConnectorResult<()> {
    if let Some(country) = country {
        if !is_valid_country_code(country) {
            return Err(ConnectorError::Validation(
                "business_country must be a 2-letter ISO 3166-1 country code".to_string(),
            ));
        }
    }

    for (field, value) in [("email", email), ("business_ap_email", ap_email)] {
        if let Some(value) = value {
            if !is_valid_email(value) {
                return Err(ConnectorError::Validation(format!(
                    "invalid email format for {field}"
                )));
            }
        }
    }

    if let Some(phone) = phone {
        if !is_valid_phone(phone) {
            return Err(ConnectorError::Validation(format!(
                "invalid phone number format, must be ###-###-#### (e.g. 212-555-0123), got: {phone}"
            )));
        }
        // The remote tends to reject 555 test numbers
        if phone.starts_with("555-") {
            warn!(
                phone = %phone,
                "Phone number uses the 555 area code, which ResolvePay may reject"
            );
        }
    }

    Ok(())
}
