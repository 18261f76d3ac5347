//! Property-based tests for the workflow engine.
//!
//! These tests validate the state machine over randomized inputs using
//! proptest: invalid source states always fail with no action, and the
//! produced actions carry the exact flag deltas of the transition table.

use proptest::prelude::*;
use uuid::Uuid;

use cems_shared::types::{ReportId, UserId};

use crate::report::types::{BudgetCheckStatus, ReportStatus};
use crate::workflow::engine::WorkflowEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApprovalDecision, ApprovalStage, WorkflowAction};

/// Strategy for generating random report statuses.
fn arb_status() -> impl Strategy<Value = ReportStatus> {
    prop_oneof![
        Just(ReportStatus::Submitted),
        Just(ReportStatus::Approved),
        Just(ReportStatus::Rejected),
        Just(ReportStatus::PendingCeoApproval),
    ]
}

/// Strategy for generating budget check results.
fn arb_budget_check() -> impl Strategy<Value = BudgetCheckStatus> {
    prop_oneof![
        Just(BudgetCheckStatus::WithinBudget),
        Just(BudgetCheckStatus::OverBudget),
    ]
}

/// Strategy for generating random report IDs.
fn arb_report_id() -> impl Strategy<Value = ReportId> {
    any::<u128>().prop_map(|n| ReportId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating random user IDs.
fn arb_user_id() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(Uuid::from_u128(n)))
}

/// Strategy for generating non-empty remark strings.
fn arb_remarks() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,80}".prop_map(|s| s.trim().to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Manager approval routes on the budget check and stamps the record.
    #[test]
    fn prop_manager_approve_routes_on_budget_check(
        check in arb_budget_check(),
        report_id in arb_report_id(),
        user_id in arb_user_id()
    ) {
        let action = WorkflowEngine::manager_approve(
            ReportStatus::Submitted, check, report_id, user_id, None,
        ).unwrap();

        if let WorkflowAction::ManagerApprove {
            new_status, forwarded_to_ceo, post_spend, record,
        } = action {
            match check {
                BudgetCheckStatus::WithinBudget => {
                    prop_assert_eq!(new_status, ReportStatus::Approved);
                    prop_assert!(!forwarded_to_ceo);
                }
                BudgetCheckStatus::OverBudget => {
                    prop_assert_eq!(new_status, ReportStatus::PendingCeoApproval);
                    prop_assert!(forwarded_to_ceo);
                }
            }
            prop_assert!(post_spend);
            prop_assert_eq!(record.report_id, report_id);
            prop_assert_eq!(record.approver_id, user_id);
            prop_assert_eq!(record.stage, ApprovalStage::Manager);
            prop_assert_eq!(record.decision, ApprovalDecision::Approved);
        } else {
            prop_assert!(false, "expected ManagerApprove action");
        }
    }

    /// Manager approval from any non-Submitted status fails.
    #[test]
    fn prop_manager_approve_invalid_source_fails(
        status in arb_status(),
        check in arb_budget_check(),
        report_id in arb_report_id(),
        user_id in arb_user_id()
    ) {
        prop_assume!(status != ReportStatus::Submitted);

        let result = WorkflowEngine::manager_approve(status, check, report_id, user_id, None);
        if let Err(WorkflowError::InvalidTransition { from, .. }) = result {
            prop_assert_eq!(from, status);
        } else {
            prop_assert!(false, "expected InvalidTransition error");
        }
    }

    /// Manager rejection from any non-Submitted status fails.
    #[test]
    fn prop_manager_reject_invalid_source_fails(
        status in arb_status(),
        report_id in arb_report_id(),
        user_id in arb_user_id(),
        remarks in arb_remarks()
    ) {
        prop_assume!(status != ReportStatus::Submitted);
        prop_assume!(!remarks.trim().is_empty());

        let result = WorkflowEngine::manager_reject(status, report_id, user_id, remarks);
        let is_invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
        prop_assert!(is_invalid);
    }

    /// CEO decisions from any non-escalated status fail.
    #[test]
    fn prop_ceo_decisions_require_escalated_status(
        status in arb_status(),
        report_id in arb_report_id(),
        user_id in arb_user_id(),
        remarks in arb_remarks()
    ) {
        prop_assume!(status != ReportStatus::PendingCeoApproval);
        prop_assume!(!remarks.trim().is_empty());

        let approve = WorkflowEngine::ceo_approve(status, report_id, user_id, None, vec![]);
        let approve_invalid = matches!(approve, Err(WorkflowError::InvalidTransition { .. }));
        prop_assert!(approve_invalid);

        let reject = WorkflowEngine::ceo_reject(status, report_id, user_id, remarks);
        let reject_invalid = matches!(reject, Err(WorkflowError::InvalidTransition { .. }));
        prop_assert!(reject_invalid);
    }

    /// Resubmission succeeds exactly when the report is not Approved.
    #[test]
    fn prop_resubmit_guarded_by_approved(status in arb_status()) {
        let result = WorkflowEngine::resubmit(status);
        if status == ReportStatus::Approved {
            let is_invalid = matches!(result, Err(WorkflowError::InvalidTransition { .. }));
            prop_assert!(is_invalid);
        } else {
            prop_assert_eq!(result.unwrap().new_status(), ReportStatus::Submitted);
        }
    }

    /// The eligibility filter matches its definition for all flag combinations.
    #[test]
    fn prop_finance_eligibility_definition(
        status in arb_status(),
        reimbursed in any::<bool>(),
        check in arb_budget_check(),
        ceo_approved in any::<bool>()
    ) {
        let eligible = WorkflowEngine::finance_eligible(status, reimbursed, check, ceo_approved);
        let expected = status == ReportStatus::Approved
            && !reimbursed
            && (check == BudgetCheckStatus::WithinBudget || ceo_approved);
        prop_assert_eq!(eligible, expected);
    }

    /// Every successful engine action lands on a status reachable from
    /// its source according to the transition matrix.
    #[test]
    fn prop_actions_respect_transition_matrix(
        check in arb_budget_check(),
        report_id in arb_report_id(),
        user_id in arb_user_id(),
        remarks in arb_remarks()
    ) {
        prop_assume!(!remarks.trim().is_empty());

        let actions = [
            WorkflowEngine::manager_approve(
                ReportStatus::Submitted, check, report_id, user_id, None,
            ).map(|a| (ReportStatus::Submitted, a)),
            WorkflowEngine::manager_reject(
                ReportStatus::Submitted, report_id, user_id, remarks.clone(),
            ).map(|a| (ReportStatus::Submitted, a)),
            WorkflowEngine::forward_to_ceo(
                ReportStatus::Submitted, report_id, user_id, None,
            ).map(|a| (ReportStatus::Submitted, a)),
            WorkflowEngine::ceo_approve(
                ReportStatus::PendingCeoApproval, report_id, user_id, None, vec![],
            ).map(|a| (ReportStatus::PendingCeoApproval, a)),
            WorkflowEngine::ceo_reject(
                ReportStatus::PendingCeoApproval, report_id, user_id, remarks,
            ).map(|a| (ReportStatus::PendingCeoApproval, a)),
            WorkflowEngine::resubmit(ReportStatus::Rejected)
                .map(|a| (ReportStatus::Rejected, a)),
        ];

        for result in actions {
            let (from, action) = result.unwrap();
            prop_assert!(WorkflowEngine::is_valid_transition(from, action.new_status()));
        }
    }
}
