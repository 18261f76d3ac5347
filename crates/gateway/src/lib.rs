//! Payment gateway capability for CEMS.
//!
//! The workflow core only needs two operations from the processor:
//! "create a checkout session" and "query payment status by identifier".
//! This crate provides that capability as a trait, a PayMongo-backed
//! implementation, a no-op fallback for unconfigured deployments, and
//! webhook signature verification.

pub mod error;
pub mod noop;
pub mod paymongo;
pub mod webhook;

pub use error::GatewayError;
pub use noop::NoopGateway;
pub use paymongo::PayMongoClient;

use async_trait::async_trait;
use rust_decimal::Decimal;

use cems_shared::types::ReportId;

/// Request to open a checkout session for a report reimbursement.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Amount to collect.
    pub amount: Decimal,
    /// Human-readable description shown at checkout.
    pub description: String,
    /// The report being reimbursed.
    pub report_id: ReportId,
    /// Redirect URL after successful payment.
    pub success_url: String,
    /// Redirect URL after cancellation.
    pub cancel_url: String,
    /// Optional payee email forwarded to the processor.
    pub customer_email: Option<String>,
    /// Optional payee name forwarded to the processor.
    pub customer_name: Option<String>,
}

/// A created checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// External session identifier.
    pub session_id: String,
    /// Checkout URL for the payee.
    pub checkout_url: String,
}

/// Capability boundary to the external payment processor.
///
/// Callers must treat every error as "nothing happened remotely is
/// unknown, nothing happened locally": no local state is mutated until a
/// confirmed response is parsed.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout session and returns its identifier and URL.
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Queries a session's payment status.
    ///
    /// Returns the processor's status string; `"paid"` is the only value
    /// with workflow effect.
    async fn get_checkout_status(&self, session_id: &str) -> Result<String, GatewayError>;
}
