//! Report validation and total computation.
//!
//! Submission and resubmission share the exact same computation: validate
//! the items, sum the total, and collect the distinct categories for the
//! budget check.

use rust_decimal::Decimal;

use crate::report::error::ReportError;
use crate::report::types::{NewExpenseItem, ReportStatus};

/// Stateless service for report-level rules.
pub struct ReportService;

impl ReportService {
    /// Validates a batch of submission items.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::EmptyItems` for an empty batch,
    /// `ReportError::EmptyCategory` for a blank category,
    /// `ReportError::NonPositiveAmount` for a zero or negative amount, and
    /// `ReportError::InvalidPrecision` for more than 2 decimal places.
    pub fn validate_items(items: &[NewExpenseItem]) -> Result<(), ReportError> {
        if items.is_empty() {
            return Err(ReportError::EmptyItems);
        }

        for (index, item) in items.iter().enumerate() {
            if item.category.trim().is_empty() {
                return Err(ReportError::EmptyCategory { index });
            }
            if item.amount <= Decimal::ZERO {
                return Err(ReportError::NonPositiveAmount {
                    index,
                    amount: item.amount,
                });
            }
            if item.amount.scale() > 2 {
                return Err(ReportError::InvalidPrecision {
                    index,
                    amount: item.amount,
                });
            }
        }

        Ok(())
    }

    /// Computes the report total as the sum of item amounts.
    ///
    /// Recomputed identically on submit and resubmit.
    #[must_use]
    pub fn total_amount(items: &[NewExpenseItem]) -> Decimal {
        items.iter().map(|i| i.amount).sum()
    }

    /// Returns the distinct trimmed categories in first-occurrence order.
    #[must_use]
    pub fn distinct_categories(items: &[NewExpenseItem]) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for item in items {
            let category = item.category.trim();
            if !seen.iter().any(|c| c == category) {
                seen.push(category.to_string());
            }
        }
        seen
    }

    /// Sums item amounts per distinct category, in first-occurrence order.
    #[must_use]
    pub fn category_totals(items: &[NewExpenseItem]) -> Vec<(String, Decimal)> {
        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for item in items {
            let category = item.category.trim();
            match totals.iter_mut().find(|(c, _)| c == category) {
                Some((_, total)) => *total += item.amount,
                None => totals.push((category.to_string(), item.amount)),
            }
        }
        totals
    }

    /// Checks that a report may be edited and resubmitted.
    ///
    /// Items become immutable once a report reaches `Approved`; edits then
    /// require no path at all (the report is terminal).
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotEditable` for an approved report.
    pub fn ensure_editable(status: ReportStatus) -> Result<(), ReportError> {
        if status.is_editable() {
            Ok(())
        } else {
            Err(ReportError::NotEditable { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn item(category: &str, amount: Decimal) -> NewExpenseItem {
        NewExpenseItem {
            category: category.to_string(),
            amount,
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            description: None,
            receipt_ref: None,
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_items() {
        let items = vec![item("Fuel", dec!(120.50)), item("Travel", dec!(80))];
        assert!(ReportService::validate_items(&items).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_batch() {
        assert!(matches!(
            ReportService::validate_items(&[]),
            Err(ReportError::EmptyItems)
        ));
    }

    #[test]
    fn test_validate_rejects_blank_category() {
        let items = vec![item("Fuel", dec!(10)), item("   ", dec!(10))];
        assert!(matches!(
            ReportService::validate_items(&items),
            Err(ReportError::EmptyCategory { index: 1 })
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        let items = vec![item("Fuel", dec!(0))];
        assert!(matches!(
            ReportService::validate_items(&items),
            Err(ReportError::NonPositiveAmount { index: 0, .. })
        ));

        let items = vec![item("Fuel", dec!(-12.30))];
        assert!(matches!(
            ReportService::validate_items(&items),
            Err(ReportError::NonPositiveAmount { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_sub_cent_precision() {
        let items = vec![item("Fuel", dec!(10.505))];
        assert!(matches!(
            ReportService::validate_items(&items),
            Err(ReportError::InvalidPrecision { index: 0, .. })
        ));
    }

    #[test]
    fn test_total_is_sum_of_item_amounts() {
        let items = vec![
            item("Fuel", dec!(120.50)),
            item("Travel", dec!(80)),
            item("Fuel", dec!(19.50)),
        ];
        assert_eq!(ReportService::total_amount(&items), dec!(220.00));
    }

    #[test]
    fn test_total_of_empty_batch_is_zero() {
        assert_eq!(ReportService::total_amount(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_distinct_categories_dedupes_trimmed() {
        let items = vec![
            item("Fuel", dec!(1)),
            item(" Fuel ", dec!(1)),
            item("Travel", dec!(1)),
        ];
        assert_eq!(
            ReportService::distinct_categories(&items),
            vec!["Fuel", "Travel"]
        );
    }

    #[test]
    fn test_category_totals_accumulate() {
        let items = vec![
            item("Fuel", dec!(100)),
            item("Travel", dec!(50)),
            item("Fuel", dec!(25.25)),
        ];
        assert_eq!(
            ReportService::category_totals(&items),
            vec![
                ("Fuel".to_string(), dec!(125.25)),
                ("Travel".to_string(), dec!(50)),
            ]
        );
    }

    #[test]
    fn test_ensure_editable() {
        assert!(ReportService::ensure_editable(ReportStatus::Submitted).is_ok());
        assert!(ReportService::ensure_editable(ReportStatus::Rejected).is_ok());
        assert!(ReportService::ensure_editable(ReportStatus::PendingCeoApproval).is_ok());
        assert!(matches!(
            ReportService::ensure_editable(ReportStatus::Approved),
            Err(ReportError::NotEditable {
                status: ReportStatus::Approved
            })
        ));
    }
}
