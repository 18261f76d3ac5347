//! Workflow domain types for the report approval pipeline.
//!
//! The per-role handling of approve/reject is a tagged variant over the
//! `{Manager, Ceo, Finance}` stages, not a per-role hierarchy: each stage
//! is one case in the transition table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use cems_shared::types::{ReportId, UserId};

use crate::report::types::ReportStatus;

/// Pipeline stage at which a decision was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStage {
    /// First-line manager review.
    Manager,
    /// CEO escalation for over-budget reports.
    Ceo,
    /// Finance reimbursement confirmation.
    Finance,
}

impl ApprovalStage {
    /// Returns the string representation of the stage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Ceo => "ceo",
            Self::Finance => "finance",
        }
    }

    /// Parses a stage from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manager" => Some(Self::Manager),
            "ceo" => Some(Self::Ceo),
            "finance" => Some(Self::Finance),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision recorded by an approval event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    /// Escalated without a final decision (forward to CEO).
    Pending,
    /// Approved at this stage.
    Approved,
    /// Rejected at this stage.
    Rejected,
}

impl ApprovalDecision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a decision from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only approval record.
///
/// One record per decision event. The trail for a report is the ordered
/// sequence of its non-superseded records; history is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    /// The report the decision applies to.
    pub report_id: ReportId,
    /// The deciding user.
    pub approver_id: UserId,
    /// Pipeline stage of the decision.
    pub stage: ApprovalStage,
    /// The decision made.
    pub decision: ApprovalDecision,
    /// Optional remarks (required for rejections).
    pub remarks: Option<String>,
    /// When the decision was made.
    pub decided_at: DateTime<Utc>,
}

/// An inline allocation change supplied with a CEO decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetReallocation {
    /// Category to reallocate.
    pub category: String,
    /// New allocated amount.
    pub allocated: Decimal,
}

/// Workflow action representing a validated state transition.
///
/// Each variant captures the resulting status, the flag changes to apply,
/// whether ledger spend posts as part of the transition, and the approval
/// record to append. The persistence layer applies the whole action as
/// one atomic transaction.
#[derive(Debug, Clone)]
pub enum WorkflowAction {
    /// Manager approved a submitted report.
    ManagerApprove {
        /// `Approved` within budget, `PendingCeoApproval` over budget.
        new_status: ReportStatus,
        /// Set when the report escalates to the CEO.
        forwarded_to_ceo: bool,
        /// Ledger spend posts at the manager stage when not yet posted.
        post_spend: bool,
        /// The approval record to append.
        record: ApprovalRecord,
    },
    /// Manager rejected a submitted report.
    ManagerReject {
        /// The new status (`Rejected`).
        new_status: ReportStatus,
        /// The approval record to append.
        record: ApprovalRecord,
    },
    /// Manager escalated a submitted report without deciding.
    ForwardToCeo {
        /// The new status (`PendingCeoApproval`).
        new_status: ReportStatus,
        /// The approval record to append (decision `Pending`).
        record: ApprovalRecord,
    },
    /// CEO approved an escalated report.
    CeoApprove {
        /// The new status (`Approved`).
        new_status: ReportStatus,
        /// Allocation changes applied atomically with the decision.
        reallocations: Vec<BudgetReallocation>,
        /// The approval record to append.
        record: ApprovalRecord,
    },
    /// CEO rejected an escalated report.
    CeoReject {
        /// The new status (`Rejected`).
        new_status: ReportStatus,
        /// The approval record to append.
        record: ApprovalRecord,
    },
    /// Driver resubmitted an unapproved report.
    ///
    /// Clears `forwarded_to_ceo`, `ceo_approved`, `reimbursed`, and
    /// `spend_posted`; supersedes the prior approval trail.
    Resubmit {
        /// The new status (`Submitted`).
        new_status: ReportStatus,
    },
}

impl WorkflowAction {
    /// Returns the new status resulting from this action.
    #[must_use]
    pub fn new_status(&self) -> ReportStatus {
        match self {
            Self::ManagerApprove { new_status, .. }
            | Self::ManagerReject { new_status, .. }
            | Self::ForwardToCeo { new_status, .. }
            | Self::CeoApprove { new_status, .. }
            | Self::CeoReject { new_status, .. }
            | Self::Resubmit { new_status } => *new_status,
        }
    }

    /// Returns the approval record carried by this action, if any.
    #[must_use]
    pub fn record(&self) -> Option<&ApprovalRecord> {
        match self {
            Self::ManagerApprove { record, .. }
            | Self::ManagerReject { record, .. }
            | Self::ForwardToCeo { record, .. }
            | Self::CeoApprove { record, .. }
            | Self::CeoReject { record, .. } => Some(record),
            Self::Resubmit { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trip() {
        assert_eq!(ApprovalStage::parse("manager"), Some(ApprovalStage::Manager));
        assert_eq!(ApprovalStage::parse("CEO"), Some(ApprovalStage::Ceo));
        assert_eq!(ApprovalStage::parse("Finance"), Some(ApprovalStage::Finance));
        assert_eq!(ApprovalStage::parse("driver"), None);
        assert_eq!(ApprovalStage::Manager.as_str(), "manager");
        assert_eq!(format!("{}", ApprovalStage::Finance), "finance");
    }

    #[test]
    fn test_decision_round_trip() {
        assert_eq!(
            ApprovalDecision::parse("approved"),
            Some(ApprovalDecision::Approved)
        );
        assert_eq!(
            ApprovalDecision::parse("REJECTED"),
            Some(ApprovalDecision::Rejected)
        );
        assert_eq!(
            ApprovalDecision::parse("pending"),
            Some(ApprovalDecision::Pending)
        );
        assert_eq!(ApprovalDecision::parse("maybe"), None);
    }
}
