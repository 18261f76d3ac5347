//! Database enum types and their conversions to core domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense report workflow status.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_status")]
pub enum ReportStatus {
    /// Awaiting manager review.
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// Accepted; items immutable.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected; driver may resubmit.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Escalated to the CEO.
    #[sea_orm(string_value = "pending_ceo_approval")]
    PendingCeoApproval,
}

impl ReportStatus {
    /// Converts to the core domain status.
    #[must_use]
    pub fn to_core(&self) -> cems_core::report::ReportStatus {
        match self {
            Self::Submitted => cems_core::report::ReportStatus::Submitted,
            Self::Approved => cems_core::report::ReportStatus::Approved,
            Self::Rejected => cems_core::report::ReportStatus::Rejected,
            Self::PendingCeoApproval => cems_core::report::ReportStatus::PendingCeoApproval,
        }
    }

    /// Converts from the core domain status.
    #[must_use]
    pub fn from_core(status: cems_core::report::ReportStatus) -> Self {
        match status {
            cems_core::report::ReportStatus::Submitted => Self::Submitted,
            cems_core::report::ReportStatus::Approved => Self::Approved,
            cems_core::report::ReportStatus::Rejected => Self::Rejected,
            cems_core::report::ReportStatus::PendingCeoApproval => Self::PendingCeoApproval,
        }
    }
}

/// Budget check verdict computed at submission time.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "budget_check_status")]
pub enum BudgetCheckStatus {
    /// Every category projection fits its allocation.
    #[sea_orm(string_value = "within_budget")]
    WithinBudget,
    /// At least one category projection exceeds its allocation.
    #[sea_orm(string_value = "over_budget")]
    OverBudget,
}

impl BudgetCheckStatus {
    /// Converts to the core domain verdict.
    #[must_use]
    pub fn to_core(&self) -> cems_core::report::BudgetCheckStatus {
        match self {
            Self::WithinBudget => cems_core::report::BudgetCheckStatus::WithinBudget,
            Self::OverBudget => cems_core::report::BudgetCheckStatus::OverBudget,
        }
    }

    /// Converts from the core domain verdict.
    #[must_use]
    pub fn from_core(check: cems_core::report::BudgetCheckStatus) -> Self {
        match check {
            cems_core::report::BudgetCheckStatus::WithinBudget => Self::WithinBudget,
            cems_core::report::BudgetCheckStatus::OverBudget => Self::OverBudget,
        }
    }
}

/// Approval pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_stage")]
pub enum ApprovalStage {
    /// Manager review.
    #[sea_orm(string_value = "manager")]
    Manager,
    /// CEO escalation.
    #[sea_orm(string_value = "ceo")]
    Ceo,
    /// Finance confirmation.
    #[sea_orm(string_value = "finance")]
    Finance,
}

impl ApprovalStage {
    /// Converts to the core domain stage.
    #[must_use]
    pub fn to_core(&self) -> cems_core::workflow::ApprovalStage {
        match self {
            Self::Manager => cems_core::workflow::ApprovalStage::Manager,
            Self::Ceo => cems_core::workflow::ApprovalStage::Ceo,
            Self::Finance => cems_core::workflow::ApprovalStage::Finance,
        }
    }

    /// Converts from the core domain stage.
    #[must_use]
    pub fn from_core(stage: cems_core::workflow::ApprovalStage) -> Self {
        match stage {
            cems_core::workflow::ApprovalStage::Manager => Self::Manager,
            cems_core::workflow::ApprovalStage::Ceo => Self::Ceo,
            cems_core::workflow::ApprovalStage::Finance => Self::Finance,
        }
    }
}

/// Approval decision recorded by a pipeline event.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "approval_decision")]
pub enum ApprovalDecision {
    /// Escalated without a final decision.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Approved at this stage.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Rejected at this stage.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ApprovalDecision {
    /// Converts to the core domain decision.
    #[must_use]
    pub fn to_core(&self) -> cems_core::workflow::ApprovalDecision {
        match self {
            Self::Pending => cems_core::workflow::ApprovalDecision::Pending,
            Self::Approved => cems_core::workflow::ApprovalDecision::Approved,
            Self::Rejected => cems_core::workflow::ApprovalDecision::Rejected,
        }
    }

    /// Converts from the core domain decision.
    #[must_use]
    pub fn from_core(decision: cems_core::workflow::ApprovalDecision) -> Self {
        match decision {
            cems_core::workflow::ApprovalDecision::Pending => Self::Pending,
            cems_core::workflow::ApprovalDecision::Approved => Self::Approved,
            cems_core::workflow::ApprovalDecision::Rejected => Self::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_status_round_trip() {
        for status in [
            cems_core::report::ReportStatus::Submitted,
            cems_core::report::ReportStatus::Approved,
            cems_core::report::ReportStatus::Rejected,
            cems_core::report::ReportStatus::PendingCeoApproval,
        ] {
            assert_eq!(ReportStatus::from_core(status).to_core(), status);
        }
    }

    #[test]
    fn test_budget_check_round_trip() {
        for check in [
            cems_core::report::BudgetCheckStatus::WithinBudget,
            cems_core::report::BudgetCheckStatus::OverBudget,
        ] {
            assert_eq!(BudgetCheckStatus::from_core(check).to_core(), check);
        }
    }

    #[test]
    fn test_stage_and_decision_round_trip() {
        for stage in [
            cems_core::workflow::ApprovalStage::Manager,
            cems_core::workflow::ApprovalStage::Ceo,
            cems_core::workflow::ApprovalStage::Finance,
        ] {
            assert_eq!(ApprovalStage::from_core(stage).to_core(), stage);
        }
        for decision in [
            cems_core::workflow::ApprovalDecision::Pending,
            cems_core::workflow::ApprovalDecision::Approved,
            cems_core::workflow::ApprovalDecision::Rejected,
        ] {
            assert_eq!(ApprovalDecision::from_core(decision).to_core(), decision);
        }
    }
}
