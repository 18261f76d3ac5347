//! Reimbursement payment types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use cems_shared::types::{PaymentId, ReportId, UserId};

/// Known payment session states at the external processor.
///
/// The processor may report other strings; anything that is not `paid`
/// has no workflow effect, so unknown values are stored verbatim and
/// treated as not paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Session created, payment outstanding.
    Unpaid,
    /// Payment completed.
    Paid,
    /// Session expired without payment.
    Expired,
}

impl PaymentStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Expired => "expired",
        }
    }

    /// Parses a known status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unpaid" => Some(Self::Unpaid),
            "paid" => Some(Self::Paid),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reimbursement payment session snapshot.
///
/// At most one active (non-expired) session exists per report at any
/// time; re-initiation replaces the existing active session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Payment record ID.
    pub id: PaymentId,
    /// The report being reimbursed.
    pub report_id: ReportId,
    /// External checkout session identifier.
    pub session_id: String,
    /// Checkout URL handed to the payee.
    pub checkout_url: String,
    /// Raw status string as last reported by the processor.
    pub status: String,
    /// Session amount.
    pub amount: Decimal,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the payment completed, if it has.
    pub paid_at: Option<DateTime<Utc>>,
    /// Finance user who initiated the session.
    pub processed_by: Option<UserId>,
}

impl PaymentSession {
    /// Returns true when the processor reported this session paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid.as_str()
    }

    /// Returns true when the session can still complete (not expired).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status != PaymentStatus::Expired.as_str()
    }
}

/// Outcome of planning a payment confirmation.
///
/// The persistence layer applies the outcome as one atomic transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// External status is not `paid`: record it on the payment row only,
    /// no workflow effect.
    RecordStatusOnly {
        /// The raw status string to store.
        status: String,
    },
    /// First paid confirmation: mark the report reimbursed, stamp
    /// `paid_at`, append the finance-stage approval, and post ledger
    /// spend when it has not been posted yet.
    Reimburse {
        /// True when ledger spend must post with this confirmation.
        post_spend: bool,
    },
    /// The report is already reimbursed: idempotent no-op.
    AlreadySettled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn session(status: &str) -> PaymentSession {
        PaymentSession {
            id: PaymentId::new(),
            report_id: ReportId::new(),
            session_id: "cs_test_123".to_string(),
            checkout_url: "https://checkout.example/cs_test_123".to_string(),
            status: status.to_string(),
            amount: dec!(1200),
            created_at: Utc::now(),
            paid_at: None,
            processed_by: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(PaymentStatus::parse("unpaid"), Some(PaymentStatus::Unpaid));
        assert_eq!(PaymentStatus::parse("PAID"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::parse("Expired"), Some(PaymentStatus::Expired));
        assert_eq!(PaymentStatus::parse("refunded"), None);
        assert_eq!(PaymentStatus::Paid.as_str(), "paid");
    }

    #[test]
    fn test_session_is_paid() {
        assert!(session("paid").is_paid());
        assert!(!session("unpaid").is_paid());
        assert!(!session("awaiting_payment_method").is_paid());
    }

    #[test]
    fn test_session_is_active() {
        assert!(session("unpaid").is_active());
        assert!(session("paid").is_active());
        assert!(!session("expired").is_active());
    }
}
