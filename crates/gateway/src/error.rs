//! Gateway error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by the payment gateway capability.
///
/// All variants are surfaced to callers as retryable external-service
/// failures; the operation that triggered them performs no local
/// mutation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No gateway secret is configured for this deployment.
    #[error(
        "Payment gateway is not configured. Set paymongo.secret_key in configuration \
         or the CEMS__PAYMONGO__SECRET_KEY environment variable"
    )]
    NotConfigured,

    /// The processor requires a minimum charge of 1.00.
    #[error("Amount must be at least 1.00 (got {0})")]
    AmountBelowMinimum(Decimal),

    /// Transport-level failure reaching the processor.
    #[error("Payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor answered with a non-success status.
    #[error("Payment gateway error ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status code returned.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The processor's response could not be interpreted.
    #[error("Unparseable payment gateway response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        assert!(
            GatewayError::AmountBelowMinimum(dec!(0.50))
                .to_string()
                .contains("0.50")
        );
        let err = GatewayError::UnexpectedStatus {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert!(err.to_string().contains("401"));
        assert!(
            GatewayError::NotConfigured
                .to_string()
                .contains("secret_key")
        );
    }
}
