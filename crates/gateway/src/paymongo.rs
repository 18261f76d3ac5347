//! PayMongo checkout session client.
//!
//! Amounts are sent in centavos; PayMongo rejects charges below 100
//! centavos. A checkout session reporting a non-empty `payments` array
//! is paid regardless of its `status` field.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use tracing::{debug, warn};

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::{CheckoutRequest, CheckoutSession, PaymentGateway};

/// Minimum chargeable amount in centavos.
const MIN_CENTAVOS: i64 = 100;

/// HTTP client for the PayMongo checkout sessions API.
#[derive(Debug, Clone)]
pub struct PayMongoClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PayMongoClient {
    /// Creates a client against the given API base URL.
    #[must_use]
    pub fn new(secret_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for PayMongoClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let centavos = amount_to_centavos(request.amount)?;
        let payload = checkout_payload(&request, centavos);

        debug!(report_id = %request.report_id, centavos, "Creating checkout session");

        let response = self
            .http
            .post(format!("{}/checkout_sessions", self.base_url))
            .basic_auth(&self.secret_key, Some(""))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Checkout session creation failed");
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_checkout_response(&body)
    }

    async fn get_checkout_status(&self, session_id: &str) -> Result<String, GatewayError> {
        let response = self
            .http
            .get(format!("{}/checkout_sessions/{session_id}", self.base_url))
            .basic_auth(&self.secret_key, Some(""))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        parse_status_response(&body)
    }
}

/// Converts a currency amount to whole centavos.
fn amount_to_centavos(amount: Decimal) -> Result<i64, GatewayError> {
    let centavos = (amount * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or(GatewayError::AmountBelowMinimum(amount))?;

    if centavos < MIN_CENTAVOS {
        return Err(GatewayError::AmountBelowMinimum(amount));
    }

    Ok(centavos)
}

/// Builds the checkout session payload.
fn checkout_payload(request: &CheckoutRequest, centavos: i64) -> Value {
    let mut attributes = json!({
        "description": request.description,
        "payment_method_types": ["gcash"],
        "line_items": [{
            "currency": "PHP",
            "amount": centavos,
            "description": request.description,
            "name": format!("Reimbursement - Report {}", request.report_id),
            "quantity": 1,
        }],
        "success_url": request.success_url,
        "cancel_url": request.cancel_url,
    });

    if let Some(email) = &request.customer_email {
        attributes["customer_email"] = json!(email);
        attributes["billing"] = json!({
            "email": email,
            "name": request.customer_name.as_deref().unwrap_or(email),
        });
    }

    json!({ "data": { "attributes": attributes } })
}

/// Extracts the session id and checkout URL from a creation response.
fn parse_checkout_response(body: &str) -> Result<CheckoutSession, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    let data = &value["data"];
    let session_id = data["id"]
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse("missing data.id".to_string()))?;
    let checkout_url = data["attributes"]["checkout_url"].as_str().ok_or_else(|| {
        GatewayError::InvalidResponse("missing data.attributes.checkout_url".to_string())
    })?;

    Ok(CheckoutSession {
        session_id: session_id.to_string(),
        checkout_url: checkout_url.to_string(),
    })
}

/// Extracts the payment status from a session lookup response.
fn parse_status_response(body: &str) -> Result<String, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

    let attributes = &value["data"]["attributes"];

    // A non-empty payments array means paid regardless of the status field.
    if attributes["payments"]
        .as_array()
        .is_some_and(|payments| !payments.is_empty())
    {
        return Ok("paid".to_string());
    }

    Ok(attributes["status"]
        .as_str()
        .unwrap_or("unknown")
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cems_shared::types::ReportId;
    use rust_decimal_macros::dec;

    fn request(amount: Decimal) -> CheckoutRequest {
        CheckoutRequest {
            amount,
            description: "Expense reimbursement".to_string(),
            report_id: ReportId::new(),
            success_url: "https://cems.example/success".to_string(),
            cancel_url: "https://cems.example/cancel".to_string(),
            customer_email: None,
            customer_name: None,
        }
    }

    #[test]
    fn test_amount_converts_to_centavos() {
        assert_eq!(amount_to_centavos(dec!(1)).unwrap(), 100);
        assert_eq!(amount_to_centavos(dec!(1200)).unwrap(), 120_000);
        assert_eq!(amount_to_centavos(dec!(19.99)).unwrap(), 1999);
    }

    #[test]
    fn test_amount_below_minimum_rejected() {
        assert!(matches!(
            amount_to_centavos(dec!(0.99)),
            Err(GatewayError::AmountBelowMinimum(_))
        ));
        assert!(matches!(
            amount_to_centavos(dec!(0)),
            Err(GatewayError::AmountBelowMinimum(_))
        ));
    }

    #[test]
    fn test_payload_shape() {
        let payload = checkout_payload(&request(dec!(500)), 50_000);
        let attributes = &payload["data"]["attributes"];

        assert_eq!(attributes["line_items"][0]["amount"], 50_000);
        assert_eq!(attributes["line_items"][0]["currency"], "PHP");
        assert_eq!(attributes["success_url"], "https://cems.example/success");
        assert!(attributes.get("customer_email").is_none());
    }

    #[test]
    fn test_payload_includes_billing_when_email_present() {
        let mut req = request(dec!(500));
        req.customer_email = Some("driver@expense.com".to_string());
        let payload = checkout_payload(&req, 50_000);
        let attributes = &payload["data"]["attributes"];

        assert_eq!(attributes["customer_email"], "driver@expense.com");
        // Billing name falls back to the email when no name is supplied.
        assert_eq!(attributes["billing"]["name"], "driver@expense.com");
    }

    #[test]
    fn test_parse_checkout_response() {
        let body = r#"{
            "data": {
                "id": "cs_abc123",
                "attributes": { "checkout_url": "https://checkout.paymongo.com/cs_abc123" }
            }
        }"#;
        let session = parse_checkout_response(body).unwrap();
        assert_eq!(session.session_id, "cs_abc123");
        assert_eq!(
            session.checkout_url,
            "https://checkout.paymongo.com/cs_abc123"
        );
    }

    #[test]
    fn test_parse_checkout_response_missing_fields() {
        assert!(matches!(
            parse_checkout_response(r#"{"data":{}}"#),
            Err(GatewayError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_checkout_response("not json"),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_status_payments_array_wins() {
        let body = r#"{
            "data": {
                "attributes": {
                    "status": "active",
                    "payments": [{ "id": "pay_1" }]
                }
            }
        }"#;
        assert_eq!(parse_status_response(body).unwrap(), "paid");
    }

    #[test]
    fn test_parse_status_falls_back_to_status_field() {
        let body = r#"{
            "data": { "attributes": { "status": "expired", "payments": [] } }
        }"#;
        assert_eq!(parse_status_response(body).unwrap(), "expired");
    }

    #[test]
    fn test_parse_status_unknown_when_absent() {
        let body = r#"{ "data": { "attributes": {} } }"#;
        assert_eq!(parse_status_response(body).unwrap(), "unknown");
    }
}
