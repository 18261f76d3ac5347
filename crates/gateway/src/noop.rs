//! Fallback gateway used when PayMongo is not configured.
//!
//! Registered at startup instead of the real client so that an
//! unconfigured deployment surfaces a clear error on first use rather
//! than a confusing authorization failure.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::{CheckoutRequest, CheckoutSession, PaymentGateway};

/// Gateway implementation whose every call reports the missing
/// configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGateway;

#[async_trait]
impl PaymentGateway for NoopGateway {
    async fn create_checkout_session(
        &self,
        _request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    async fn get_checkout_status(&self, _session_id: &str) -> Result<String, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}
