//! Workflow engine for expense report state transitions.
//!
//! This module implements the core state machine logic for driving a
//! report through manager review, CEO escalation, and reimbursement
//! eligibility. Every method validates the source state and returns a
//! `WorkflowAction` that the persistence layer applies atomically; no
//! partial effect is ever described.

use chrono::Utc;

use cems_shared::types::{ReportId, UserId};

use crate::report::types::{BudgetCheckStatus, ReportStatus};
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    ApprovalDecision, ApprovalRecord, ApprovalStage, BudgetReallocation, WorkflowAction,
};

/// Stateless engine for report workflow transitions.
pub struct WorkflowEngine;

impl WorkflowEngine {
    /// Manager approves a submitted report.
    ///
    /// Within budget the report moves straight to `Approved`; over budget
    /// it escalates to `PendingCeoApproval` with `forwarded_to_ceo` set.
    /// Ledger spend posts at the manager stage in both cases.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition` unless the report is
    /// `Submitted`.
    pub fn manager_approve(
        current_status: ReportStatus,
        budget_check: BudgetCheckStatus,
        report_id: ReportId,
        approved_by: UserId,
        remarks: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        let (new_status, forwarded_to_ceo) = match budget_check {
            BudgetCheckStatus::WithinBudget => (ReportStatus::Approved, false),
            BudgetCheckStatus::OverBudget => (ReportStatus::PendingCeoApproval, true),
        };

        match current_status {
            ReportStatus::Submitted => Ok(WorkflowAction::ManagerApprove {
                new_status,
                forwarded_to_ceo,
                post_spend: true,
                record: ApprovalRecord {
                    report_id,
                    approver_id: approved_by,
                    stage: ApprovalStage::Manager,
                    decision: ApprovalDecision::Approved,
                    remarks,
                    decided_at: Utc::now(),
                },
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: new_status,
            }),
        }
    }

    /// Manager rejects a submitted report.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::RemarksRequired` for blank remarks and
    /// `WorkflowError::InvalidTransition` unless the report is `Submitted`.
    pub fn manager_reject(
        current_status: ReportStatus,
        report_id: ReportId,
        rejected_by: UserId,
        remarks: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if remarks.trim().is_empty() {
            return Err(WorkflowError::RemarksRequired);
        }

        match current_status {
            ReportStatus::Submitted => Ok(WorkflowAction::ManagerReject {
                new_status: ReportStatus::Rejected,
                record: ApprovalRecord {
                    report_id,
                    approver_id: rejected_by,
                    stage: ApprovalStage::Manager,
                    decision: ApprovalDecision::Rejected,
                    remarks: Some(remarks),
                    decided_at: Utc::now(),
                },
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ReportStatus::Rejected,
            }),
        }
    }

    /// Manager escalates a submitted report to the CEO without deciding.
    ///
    /// Records a `Pending` manager-stage entry so the trail shows the
    /// escalation event.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition` unless the report is
    /// `Submitted`.
    pub fn forward_to_ceo(
        current_status: ReportStatus,
        report_id: ReportId,
        forwarded_by: UserId,
        remarks: Option<String>,
    ) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            ReportStatus::Submitted => Ok(WorkflowAction::ForwardToCeo {
                new_status: ReportStatus::PendingCeoApproval,
                record: ApprovalRecord {
                    report_id,
                    approver_id: forwarded_by,
                    stage: ApprovalStage::Manager,
                    decision: ApprovalDecision::Pending,
                    remarks,
                    decided_at: Utc::now(),
                },
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ReportStatus::PendingCeoApproval,
            }),
        }
    }

    /// CEO approves an escalated report.
    ///
    /// Sets `ceo_approved`, clears `forwarded_to_ceo`, and carries any
    /// inline allocation changes supplied with the decision.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition` unless the report is
    /// `PendingCeoApproval`, and validates every reallocation entry.
    pub fn ceo_approve(
        current_status: ReportStatus,
        report_id: ReportId,
        approved_by: UserId,
        remarks: Option<String>,
        reallocations: Vec<BudgetReallocation>,
    ) -> Result<WorkflowAction, WorkflowError> {
        for reallocation in &reallocations {
            if reallocation.category.trim().is_empty() {
                return Err(WorkflowError::ReallocationCategoryRequired);
            }
            if reallocation.allocated.is_sign_negative() {
                return Err(WorkflowError::NegativeReallocation {
                    category: reallocation.category.clone(),
                    allocated: reallocation.allocated,
                });
            }
        }

        match current_status {
            ReportStatus::PendingCeoApproval => Ok(WorkflowAction::CeoApprove {
                new_status: ReportStatus::Approved,
                reallocations,
                record: ApprovalRecord {
                    report_id,
                    approver_id: approved_by,
                    stage: ApprovalStage::Ceo,
                    decision: ApprovalDecision::Approved,
                    remarks,
                    decided_at: Utc::now(),
                },
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ReportStatus::Approved,
            }),
        }
    }

    /// CEO rejects an escalated report.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::RemarksRequired` for blank remarks and
    /// `WorkflowError::InvalidTransition` unless the report is
    /// `PendingCeoApproval`.
    pub fn ceo_reject(
        current_status: ReportStatus,
        report_id: ReportId,
        rejected_by: UserId,
        remarks: String,
    ) -> Result<WorkflowAction, WorkflowError> {
        if remarks.trim().is_empty() {
            return Err(WorkflowError::RemarksRequired);
        }

        match current_status {
            ReportStatus::PendingCeoApproval => Ok(WorkflowAction::CeoReject {
                new_status: ReportStatus::Rejected,
                record: ApprovalRecord {
                    report_id,
                    approver_id: rejected_by,
                    stage: ApprovalStage::Ceo,
                    decision: ApprovalDecision::Rejected,
                    remarks: Some(remarks),
                    decided_at: Utc::now(),
                },
            }),
            _ => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ReportStatus::Rejected,
            }),
        }
    }

    /// Driver resubmits an edited report.
    ///
    /// Legal from any status except `Approved`. The action clears the
    /// escalation and reimbursement flags and supersedes the prior
    /// approval trail; totals and the budget check are recomputed by the
    /// caller exactly as on first submission.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition` for an approved report.
    pub fn resubmit(current_status: ReportStatus) -> Result<WorkflowAction, WorkflowError> {
        match current_status {
            ReportStatus::Approved => Err(WorkflowError::InvalidTransition {
                from: current_status,
                to: ReportStatus::Submitted,
            }),
            _ => Ok(WorkflowAction::Resubmit {
                new_status: ReportStatus::Submitted,
            }),
        }
    }

    /// Reimbursement-queue visibility filter.
    ///
    /// A report is eligible for finance action only when it is approved,
    /// not yet reimbursed, and either passed the budget check or cleared
    /// CEO approval.
    #[must_use]
    pub fn finance_eligible(
        status: ReportStatus,
        reimbursed: bool,
        budget_check: BudgetCheckStatus,
        ceo_approved: bool,
    ) -> bool {
        status == ReportStatus::Approved
            && !reimbursed
            && (budget_check == BudgetCheckStatus::WithinBudget || ceo_approved)
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Submitted → Approved (manager approves within budget)
    /// - Submitted → PendingCeoApproval (manager approves over budget / forwards)
    /// - Submitted → Rejected (manager rejects)
    /// - PendingCeoApproval → Approved (CEO approves)
    /// - PendingCeoApproval → Rejected (CEO rejects)
    /// - Submitted/PendingCeoApproval/Rejected → Submitted (resubmission)
    #[must_use]
    pub fn is_valid_transition(from: ReportStatus, to: ReportStatus) -> bool {
        matches!(
            (from, to),
            (
                ReportStatus::Submitted,
                ReportStatus::Approved
                    | ReportStatus::PendingCeoApproval
                    | ReportStatus::Rejected
                    | ReportStatus::Submitted
            ) | (
                ReportStatus::PendingCeoApproval,
                ReportStatus::Approved | ReportStatus::Rejected | ReportStatus::Submitted
            ) | (ReportStatus::Rejected, ReportStatus::Submitted)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (ReportId, UserId) {
        (ReportId::new(), UserId::new())
    }

    #[test]
    fn test_manager_approve_within_budget_goes_to_approved() {
        let (report_id, user_id) = ids();
        let action = WorkflowEngine::manager_approve(
            ReportStatus::Submitted,
            BudgetCheckStatus::WithinBudget,
            report_id,
            user_id,
            None,
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::Approved);
        let WorkflowAction::ManagerApprove {
            forwarded_to_ceo,
            post_spend,
            record,
            ..
        } = action
        else {
            panic!("expected ManagerApprove action");
        };
        assert!(!forwarded_to_ceo);
        assert!(post_spend);
        assert_eq!(record.stage, ApprovalStage::Manager);
        assert_eq!(record.decision, ApprovalDecision::Approved);
    }

    #[test]
    fn test_manager_approve_over_budget_escalates() {
        let (report_id, user_id) = ids();
        let action = WorkflowEngine::manager_approve(
            ReportStatus::Submitted,
            BudgetCheckStatus::OverBudget,
            report_id,
            user_id,
            Some("needs CEO sign-off".to_string()),
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::PendingCeoApproval);
        let WorkflowAction::ManagerApprove {
            forwarded_to_ceo,
            post_spend,
            ..
        } = action
        else {
            panic!("expected ManagerApprove action");
        };
        assert!(forwarded_to_ceo);
        // Spend posts at the manager stage regardless of budget outcome.
        assert!(post_spend);
    }

    #[test]
    fn test_manager_approve_from_non_submitted_fails() {
        let (report_id, user_id) = ids();
        for status in [
            ReportStatus::Approved,
            ReportStatus::Rejected,
            ReportStatus::PendingCeoApproval,
        ] {
            let result = WorkflowEngine::manager_approve(
                status,
                BudgetCheckStatus::WithinBudget,
                report_id,
                user_id,
                None,
            );
            assert!(matches!(
                result,
                Err(WorkflowError::InvalidTransition { from, .. }) if from == status
            ));
        }
    }

    #[test]
    fn test_manager_reject_requires_remarks() {
        let (report_id, user_id) = ids();
        let result = WorkflowEngine::manager_reject(
            ReportStatus::Submitted,
            report_id,
            user_id,
            "   ".to_string(),
        );
        assert!(matches!(result, Err(WorkflowError::RemarksRequired)));
    }

    #[test]
    fn test_manager_reject_from_submitted() {
        let (report_id, user_id) = ids();
        let action = WorkflowEngine::manager_reject(
            ReportStatus::Submitted,
            report_id,
            user_id,
            "missing receipts".to_string(),
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::Rejected);
        let record = action.record().unwrap();
        assert_eq!(record.decision, ApprovalDecision::Rejected);
        assert_eq!(record.remarks.as_deref(), Some("missing receipts"));
    }

    #[test]
    fn test_forward_to_ceo_records_pending_entry() {
        let (report_id, user_id) = ids();
        let action =
            WorkflowEngine::forward_to_ceo(ReportStatus::Submitted, report_id, user_id, None)
                .unwrap();

        assert_eq!(action.new_status(), ReportStatus::PendingCeoApproval);
        let record = action.record().unwrap();
        assert_eq!(record.stage, ApprovalStage::Manager);
        assert_eq!(record.decision, ApprovalDecision::Pending);
    }

    #[test]
    fn test_forward_from_non_submitted_fails() {
        let (report_id, user_id) = ids();
        let result =
            WorkflowEngine::forward_to_ceo(ReportStatus::Rejected, report_id, user_id, None);
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_ceo_approve_from_pending() {
        let (report_id, user_id) = ids();
        let action = WorkflowEngine::ceo_approve(
            ReportStatus::PendingCeoApproval,
            report_id,
            user_id,
            None,
            vec![],
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::Approved);
        let record = action.record().unwrap();
        assert_eq!(record.stage, ApprovalStage::Ceo);
        assert_eq!(record.decision, ApprovalDecision::Approved);
    }

    #[test]
    fn test_ceo_approve_carries_reallocations() {
        use rust_decimal_macros::dec;

        let (report_id, user_id) = ids();
        let action = WorkflowEngine::ceo_approve(
            ReportStatus::PendingCeoApproval,
            report_id,
            user_id,
            None,
            vec![BudgetReallocation {
                category: "Fuel".to_string(),
                allocated: dec!(2000),
            }],
        )
        .unwrap();

        let WorkflowAction::CeoApprove { reallocations, .. } = action else {
            panic!("expected CeoApprove action");
        };
        assert_eq!(reallocations.len(), 1);
        assert_eq!(reallocations[0].allocated, dec!(2000));
    }

    #[test]
    fn test_ceo_approve_rejects_negative_reallocation() {
        use rust_decimal_macros::dec;

        let (report_id, user_id) = ids();
        let result = WorkflowEngine::ceo_approve(
            ReportStatus::PendingCeoApproval,
            report_id,
            user_id,
            None,
            vec![BudgetReallocation {
                category: "Fuel".to_string(),
                allocated: dec!(-500),
            }],
        );
        assert!(matches!(
            result,
            Err(WorkflowError::NegativeReallocation { .. })
        ));
    }

    #[test]
    fn test_ceo_approve_from_non_pending_fails() {
        let (report_id, user_id) = ids();
        let result = WorkflowEngine::ceo_approve(
            ReportStatus::Submitted,
            report_id,
            user_id,
            None,
            vec![],
        );
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_ceo_reject_requires_remarks() {
        let (report_id, user_id) = ids();
        let result = WorkflowEngine::ceo_reject(
            ReportStatus::PendingCeoApproval,
            report_id,
            user_id,
            String::new(),
        );
        assert!(matches!(result, Err(WorkflowError::RemarksRequired)));
    }

    #[test]
    fn test_ceo_reject_from_pending() {
        let (report_id, user_id) = ids();
        let action = WorkflowEngine::ceo_reject(
            ReportStatus::PendingCeoApproval,
            report_id,
            user_id,
            "budget freeze".to_string(),
        )
        .unwrap();

        assert_eq!(action.new_status(), ReportStatus::Rejected);
        assert_eq!(
            action.record().unwrap().stage,
            ApprovalStage::Ceo
        );
    }

    #[test]
    fn test_resubmit_legal_except_from_approved() {
        for status in [
            ReportStatus::Submitted,
            ReportStatus::Rejected,
            ReportStatus::PendingCeoApproval,
        ] {
            let action = WorkflowEngine::resubmit(status).unwrap();
            assert_eq!(action.new_status(), ReportStatus::Submitted);
        }

        assert!(matches!(
            WorkflowEngine::resubmit(ReportStatus::Approved),
            Err(WorkflowError::InvalidTransition {
                from: ReportStatus::Approved,
                ..
            })
        ));
    }

    #[test]
    fn test_finance_eligibility_filter() {
        // Within-budget approved report: eligible.
        assert!(WorkflowEngine::finance_eligible(
            ReportStatus::Approved,
            false,
            BudgetCheckStatus::WithinBudget,
            false,
        ));
        // Over-budget report needs CEO approval first.
        assert!(!WorkflowEngine::finance_eligible(
            ReportStatus::Approved,
            false,
            BudgetCheckStatus::OverBudget,
            false,
        ));
        assert!(WorkflowEngine::finance_eligible(
            ReportStatus::Approved,
            false,
            BudgetCheckStatus::OverBudget,
            true,
        ));
        // Already reimbursed reports leave the queue.
        assert!(!WorkflowEngine::finance_eligible(
            ReportStatus::Approved,
            true,
            BudgetCheckStatus::WithinBudget,
            false,
        ));
        // Non-approved statuses are never eligible.
        assert!(!WorkflowEngine::finance_eligible(
            ReportStatus::Submitted,
            false,
            BudgetCheckStatus::WithinBudget,
            false,
        ));
        assert!(!WorkflowEngine::finance_eligible(
            ReportStatus::PendingCeoApproval,
            false,
            BudgetCheckStatus::OverBudget,
            true,
        ));
    }

    #[test]
    fn test_is_valid_transition_matrix() {
        let statuses = [
            ReportStatus::Submitted,
            ReportStatus::Approved,
            ReportStatus::Rejected,
            ReportStatus::PendingCeoApproval,
        ];

        let valid = [
            (ReportStatus::Submitted, ReportStatus::Approved),
            (ReportStatus::Submitted, ReportStatus::PendingCeoApproval),
            (ReportStatus::Submitted, ReportStatus::Rejected),
            (ReportStatus::Submitted, ReportStatus::Submitted),
            (ReportStatus::PendingCeoApproval, ReportStatus::Approved),
            (ReportStatus::PendingCeoApproval, ReportStatus::Rejected),
            (ReportStatus::PendingCeoApproval, ReportStatus::Submitted),
            (ReportStatus::Rejected, ReportStatus::Submitted),
        ];

        for from in statuses {
            for to in statuses {
                assert_eq!(
                    WorkflowEngine::is_valid_transition(from, to),
                    valid.contains(&(from, to)),
                    "is_valid_transition({from:?}, {to:?})"
                );
            }
        }
    }

    #[test]
    fn test_approved_is_terminal_in_the_matrix() {
        for to in [
            ReportStatus::Submitted,
            ReportStatus::Approved,
            ReportStatus::Rejected,
            ReportStatus::PendingCeoApproval,
        ] {
            assert!(!WorkflowEngine::is_valid_transition(
                ReportStatus::Approved,
                to
            ));
        }
    }
}
