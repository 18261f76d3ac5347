//! Idempotent payment confirmation planning.
//!
//! Confirmations arrive redundantly and out of order (duplicate webhook
//! deliveries, a polling refresh racing a manual override), so planning
//! is keyed on the report's `reimbursed` flag and the `spend_posted`
//! marker: the ledger is credited at most once per report lifetime no
//! matter how many confirmations land.

use crate::report::types::{BudgetCheckStatus, ReportStatus};
use crate::reimbursement::error::ReimbursementError;
use crate::reimbursement::types::{ConfirmationOutcome, PaymentSession, PaymentStatus};
use crate::workflow::engine::WorkflowEngine;

/// Stateless reconciliation decisions.
pub struct Reconciler;

impl Reconciler {
    /// Plans the application of an external payment confirmation.
    ///
    /// The caller must re-read `reimbursed` and `spend_posted` inside the
    /// same transaction that applies the outcome; two confirmations must
    /// never both observe `reimbursed == false`.
    #[must_use]
    pub fn plan_confirmation(
        reimbursed: bool,
        spend_posted: bool,
        external_status: &str,
    ) -> ConfirmationOutcome {
        if external_status != PaymentStatus::Paid.as_str() {
            return ConfirmationOutcome::RecordStatusOnly {
                status: external_status.to_string(),
            };
        }

        if reimbursed {
            ConfirmationOutcome::AlreadySettled
        } else {
            ConfirmationOutcome::Reimburse {
                post_spend: !spend_posted,
            }
        }
    }

    /// Plans a manual settlement, bypassing the external processor.
    ///
    /// Follows the identical idempotent path as a paid confirmation.
    #[must_use]
    pub fn manual_settlement(reimbursed: bool, spend_posted: bool) -> ConfirmationOutcome {
        Self::plan_confirmation(reimbursed, spend_posted, PaymentStatus::Paid.as_str())
    }

    /// Checks that a new checkout session may be initiated.
    ///
    /// # Errors
    ///
    /// Returns `ReimbursementError::AlreadyPaid` when the report's active
    /// session already reports paid. An unpaid or missing session allows
    /// initiation (creating or replacing the active session).
    pub fn check_initiate(active: Option<&PaymentSession>) -> Result<(), ReimbursementError> {
        match active {
            Some(session) if session.is_paid() => Err(ReimbursementError::AlreadyPaid),
            _ => Ok(()),
        }
    }

    /// Checks that a report is in the reimbursement queue.
    ///
    /// # Errors
    ///
    /// Returns `ReimbursementError::NotEligible` unless the report is
    /// approved, unreimbursed, and either within budget or CEO-approved.
    pub fn ensure_eligible(
        status: ReportStatus,
        reimbursed: bool,
        budget_check: BudgetCheckStatus,
        ceo_approved: bool,
    ) -> Result<(), ReimbursementError> {
        if WorkflowEngine::finance_eligible(status, reimbursed, budget_check, ceo_approved) {
            Ok(())
        } else {
            Err(ReimbursementError::NotEligible { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cems_shared::types::{PaymentId, ReportId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn session(status: &str) -> PaymentSession {
        PaymentSession {
            id: PaymentId::new(),
            report_id: ReportId::new(),
            session_id: "cs_test_abc".to_string(),
            checkout_url: "https://checkout.example/cs_test_abc".to_string(),
            status: status.to_string(),
            amount: dec!(800),
            created_at: Utc::now(),
            paid_at: None,
            processed_by: None,
        }
    }

    #[test]
    fn test_non_paid_status_records_only() {
        let outcome = Reconciler::plan_confirmation(false, false, "unpaid");
        assert_eq!(
            outcome,
            ConfirmationOutcome::RecordStatusOnly {
                status: "unpaid".to_string()
            }
        );

        let outcome = Reconciler::plan_confirmation(false, false, "expired");
        assert_eq!(
            outcome,
            ConfirmationOutcome::RecordStatusOnly {
                status: "expired".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_status_never_reimburses() {
        let outcome = Reconciler::plan_confirmation(false, false, "awaiting_next_action");
        assert!(matches!(
            outcome,
            ConfirmationOutcome::RecordStatusOnly { .. }
        ));
    }

    #[test]
    fn test_first_paid_confirmation_reimburses() {
        // Spend not yet posted: confirmation posts it.
        assert_eq!(
            Reconciler::plan_confirmation(false, false, "paid"),
            ConfirmationOutcome::Reimburse { post_spend: true }
        );
        // Spend already posted at manager approval: ledger untouched.
        assert_eq!(
            Reconciler::plan_confirmation(false, true, "paid"),
            ConfirmationOutcome::Reimburse { post_spend: false }
        );
    }

    #[test]
    fn test_second_paid_confirmation_is_noop() {
        assert_eq!(
            Reconciler::plan_confirmation(true, true, "paid"),
            ConfirmationOutcome::AlreadySettled
        );
        assert_eq!(
            Reconciler::plan_confirmation(true, false, "paid"),
            ConfirmationOutcome::AlreadySettled
        );
    }

    #[test]
    fn test_manual_settlement_matches_paid_path() {
        assert_eq!(
            Reconciler::manual_settlement(false, true),
            Reconciler::plan_confirmation(false, true, "paid")
        );
        assert_eq!(
            Reconciler::manual_settlement(true, true),
            ConfirmationOutcome::AlreadySettled
        );
    }

    #[test]
    fn test_initiate_blocked_when_active_session_paid() {
        assert!(matches!(
            Reconciler::check_initiate(Some(&session("paid"))),
            Err(ReimbursementError::AlreadyPaid)
        ));
    }

    #[test]
    fn test_initiate_allowed_without_paid_session() {
        assert!(Reconciler::check_initiate(None).is_ok());
        assert!(Reconciler::check_initiate(Some(&session("unpaid"))).is_ok());
        assert!(Reconciler::check_initiate(Some(&session("expired"))).is_ok());
    }

    #[test]
    fn test_eligibility_gate() {
        assert!(
            Reconciler::ensure_eligible(
                ReportStatus::Approved,
                false,
                BudgetCheckStatus::WithinBudget,
                false,
            )
            .is_ok()
        );
        assert!(matches!(
            Reconciler::ensure_eligible(
                ReportStatus::Approved,
                false,
                BudgetCheckStatus::OverBudget,
                false,
            ),
            Err(ReimbursementError::NotEligible { .. })
        ));
        assert!(
            Reconciler::ensure_eligible(
                ReportStatus::Approved,
                false,
                BudgetCheckStatus::OverBudget,
                true,
            )
            .is_ok()
        );
    }
}
