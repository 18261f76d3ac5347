//! Report domain types for the expense lifecycle.
//!
//! This module defines the core types used for managing expense report
//! status transitions and report contents.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use cems_shared::types::{ItemId, ReportId, UserId};

/// Expense report status in the approval workflow.
///
/// Reports progress through these states from submission to reimbursement.
/// The valid transitions are:
/// - Submitted → Approved (manager approves, within budget)
/// - Submitted → PendingCeoApproval (manager approves over budget, or forwards)
/// - Submitted → Rejected (manager rejects)
/// - PendingCeoApproval → Approved (CEO approves)
/// - PendingCeoApproval → Rejected (CEO rejects)
/// - any non-Approved → Submitted (driver resubmits)
///
/// Reimbursement is a boolean overlay on `Approved`, not a separate state:
/// a reimbursed report remains `Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Report has been submitted and awaits manager review.
    Submitted,
    /// Report has been approved (terminal acceptance; items immutable).
    Approved,
    /// Report has been rejected; the driver may resubmit.
    Rejected,
    /// Over-budget report awaiting CEO sign-off.
    PendingCeoApproval,
}

impl ReportStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::PendingCeoApproval => "pending_ceo_approval",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "pending_ceo_approval" => Some(Self::PendingCeoApproval),
            _ => None,
        }
    }

    /// Returns true if the driver may edit and resubmit the report.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Approved)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the monthly budget check computed at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCheckStatus {
    /// Every category's monthly projection stays within its allocation.
    WithinBudget,
    /// At least one category's monthly projection exceeds its allocation.
    OverBudget,
}

impl BudgetCheckStatus {
    /// Returns the string representation of the check result.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WithinBudget => "within_budget",
            Self::OverBudget => "over_budget",
        }
    }

    /// Parses a check result from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "within_budget" => Some(Self::WithinBudget),
            "over_budget" => Some(Self::OverBudget),
            _ => None,
        }
    }

    /// Returns true for the over-budget result.
    #[must_use]
    pub fn is_over(&self) -> bool {
        matches!(self, Self::OverBudget)
    }
}

impl fmt::Display for BudgetCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for a single expense item at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpenseItem {
    /// Budget category the expense belongs to.
    pub category: String,
    /// Expense amount (positive, currency scale).
    pub amount: Decimal,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional reference to a stored receipt.
    pub receipt_ref: Option<String>,
}

/// A persisted expense item, owned exclusively by one report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseItem {
    /// Item ID.
    pub id: ItemId,
    /// Owning report ID.
    pub report_id: ReportId,
    /// Budget category the expense belongs to.
    pub category: String,
    /// Expense amount.
    pub amount: Decimal,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Optional reference to a stored receipt.
    pub receipt_ref: Option<String>,
}

/// An expense report snapshot with its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseReport {
    /// Report ID.
    pub id: ReportId,
    /// Submitting user.
    pub user_id: UserId,
    /// When the report was (re)submitted.
    pub submission_date: DateTime<Utc>,
    /// Current workflow status.
    pub status: ReportStatus,
    /// Budget check computed at submission time.
    pub budget_check: BudgetCheckStatus,
    /// Sum of the items' amounts.
    pub total_amount: Decimal,
    /// Set while an over-budget report awaits CEO review.
    pub forwarded_to_ceo: bool,
    /// Set when the CEO approved an over-budget report.
    pub ceo_approved: bool,
    /// Set when finance completed reimbursement.
    pub reimbursed: bool,
    /// Set when ledger spend has been posted for this report's items.
    pub spend_posted: bool,
    /// Ordered items owned by this report.
    pub items: Vec<ExpenseItem>,
}

impl ExpenseReport {
    /// Returns the distinct categories present in this report's items,
    /// in first-occurrence order.
    #[must_use]
    pub fn distinct_categories(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for item in &self.items {
            let category = item.category.trim();
            if !seen.iter().any(|c: &String| c == category) {
                seen.push(category.to_string());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(ReportStatus::Submitted.as_str(), "submitted");
        assert_eq!(ReportStatus::Approved.as_str(), "approved");
        assert_eq!(ReportStatus::Rejected.as_str(), "rejected");
        assert_eq!(
            ReportStatus::PendingCeoApproval.as_str(),
            "pending_ceo_approval"
        );
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            ReportStatus::parse("submitted"),
            Some(ReportStatus::Submitted)
        );
        assert_eq!(ReportStatus::parse("APPROVED"), Some(ReportStatus::Approved));
        assert_eq!(ReportStatus::parse("Rejected"), Some(ReportStatus::Rejected));
        assert_eq!(
            ReportStatus::parse("pending_ceo_approval"),
            Some(ReportStatus::PendingCeoApproval)
        );
        assert_eq!(ReportStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", ReportStatus::Submitted), "submitted");
        assert_eq!(
            format!("{}", ReportStatus::PendingCeoApproval),
            "pending_ceo_approval"
        );
    }

    #[test]
    fn test_status_editable() {
        assert!(ReportStatus::Submitted.is_editable());
        assert!(ReportStatus::Rejected.is_editable());
        assert!(ReportStatus::PendingCeoApproval.is_editable());
        assert!(!ReportStatus::Approved.is_editable());
    }

    #[test]
    fn test_budget_check_round_trip() {
        assert_eq!(
            BudgetCheckStatus::parse("within_budget"),
            Some(BudgetCheckStatus::WithinBudget)
        );
        assert_eq!(
            BudgetCheckStatus::parse("OVER_BUDGET"),
            Some(BudgetCheckStatus::OverBudget)
        );
        assert_eq!(BudgetCheckStatus::parse("unknown"), None);
        assert!(BudgetCheckStatus::OverBudget.is_over());
        assert!(!BudgetCheckStatus::WithinBudget.is_over());
    }

    #[test]
    fn test_distinct_categories_preserves_order_and_trims() {
        use rust_decimal_macros::dec;

        let report_id = ReportId::new();
        let item = |category: &str| ExpenseItem {
            id: ItemId::new(),
            report_id,
            category: category.to_string(),
            amount: dec!(10),
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            description: None,
            receipt_ref: None,
        };

        let report = ExpenseReport {
            id: report_id,
            user_id: UserId::new(),
            submission_date: Utc::now(),
            status: ReportStatus::Submitted,
            budget_check: BudgetCheckStatus::WithinBudget,
            total_amount: dec!(40),
            forwarded_to_ceo: false,
            ceo_approved: false,
            reimbursed: false,
            spend_posted: false,
            items: vec![item("Fuel"), item(" Travel "), item("Fuel"), item("Travel")],
        };

        assert_eq!(report.distinct_categories(), vec!["Fuel", "Travel"]);
    }
}
