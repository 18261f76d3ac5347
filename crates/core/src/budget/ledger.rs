//! Over-budget classification for expense reports.
//!
//! The check projects each category's current-month spend plus the
//! report's own amount against the category allocation. A report is over
//! budget when any single category exceeds; a category without a budget
//! row has no limit and never trips the check.

use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::{CategoryExceedance, CategoryProjection};
use crate::report::types::BudgetCheckStatus;

/// Stateless ledger arithmetic over monthly category projections.
pub struct BudgetLedger;

impl BudgetLedger {
    /// Returns true when the projection strictly exceeds the allocation.
    ///
    /// Equality is within budget; a missing allocation means "no limit".
    #[must_use]
    pub fn would_exceed(projection: &CategoryProjection) -> bool {
        match projection.allocated {
            Some(allocated) => projection.month_spent + projection.report_amount > allocated,
            None => false,
        }
    }

    /// Classifies a report across all its category projections.
    ///
    /// A report is over budget if **any** category's monthly projection
    /// exceeds its allocation. An empty projection set is within budget.
    #[must_use]
    pub fn classify(projections: &[CategoryProjection]) -> BudgetCheckStatus {
        if projections.iter().any(Self::would_exceed) {
            BudgetCheckStatus::OverBudget
        } else {
            BudgetCheckStatus::WithinBudget
        }
    }

    /// Expands projections into the per-category exceedance breakdown.
    #[must_use]
    pub fn exceedance(projections: Vec<CategoryProjection>) -> Vec<CategoryExceedance> {
        projections
            .into_iter()
            .map(|p| {
                let over_budget = Self::would_exceed(&p);
                CategoryExceedance {
                    projected_total: p.month_spent + p.report_amount,
                    over_budget,
                    category: p.category,
                    allocated: p.allocated,
                    month_spent: p.month_spent,
                    report_amount: p.report_amount,
                }
            })
            .collect()
    }

    /// Validates a category allocation value.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeAllocation` for a negative amount.
    pub fn validate_allocation(allocated: Decimal) -> Result<(), BudgetError> {
        if allocated < Decimal::ZERO {
            return Err(BudgetError::NegativeAllocation(allocated));
        }
        Ok(())
    }

    /// Validates a spend posting amount.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::NegativeSpend` for a negative amount.
    pub fn validate_spend(amount: Decimal) -> Result<(), BudgetError> {
        if amount < Decimal::ZERO {
            return Err(BudgetError::NegativeSpend(amount));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn projection(
        category: &str,
        allocated: Option<Decimal>,
        month_spent: Decimal,
        report_amount: Decimal,
    ) -> CategoryProjection {
        CategoryProjection {
            category: category.to_string(),
            allocated,
            month_spent,
            report_amount,
        }
    }

    #[test]
    fn test_over_budget_when_projection_exceeds_allocation() {
        // Fuel allocated 1000, nothing spent, report carries 1200.
        let p = projection("Fuel", Some(dec!(1000)), dec!(0), dec!(1200));
        assert!(BudgetLedger::would_exceed(&p));
        assert_eq!(
            BudgetLedger::classify(std::slice::from_ref(&p)),
            BudgetCheckStatus::OverBudget
        );
    }

    #[test]
    fn test_within_budget_when_projection_fits() {
        // Travel allocated 2000, 300 spent this month, report carries 500.
        let p = projection("Travel", Some(dec!(2000)), dec!(300), dec!(500));
        assert!(!BudgetLedger::would_exceed(&p));
        assert_eq!(
            BudgetLedger::classify(std::slice::from_ref(&p)),
            BudgetCheckStatus::WithinBudget
        );
    }

    #[test]
    fn test_equality_is_within_budget() {
        let p = projection("Fuel", Some(dec!(1000)), dec!(400), dec!(600));
        assert!(!BudgetLedger::would_exceed(&p));
    }

    #[test]
    fn test_missing_budget_row_means_no_limit() {
        let p = projection("Misc", None, dec!(0), dec!(999_999));
        assert!(!BudgetLedger::would_exceed(&p));
    }

    #[test]
    fn test_any_category_over_flags_whole_report() {
        let projections = vec![
            projection("Travel", Some(dec!(2000)), dec!(0), dec!(100)),
            projection("Fuel", Some(dec!(1000)), dec!(900), dec!(200)),
        ];
        assert_eq!(
            BudgetLedger::classify(&projections),
            BudgetCheckStatus::OverBudget
        );
    }

    #[test]
    fn test_empty_projection_set_is_within_budget() {
        assert_eq!(
            BudgetLedger::classify(&[]),
            BudgetCheckStatus::WithinBudget
        );
    }

    #[test]
    fn test_exceedance_breakdown() {
        let rows = BudgetLedger::exceedance(vec![
            projection("Fuel", Some(dec!(1000)), dec!(0), dec!(1200)),
            projection("Travel", Some(dec!(2000)), dec!(300), dec!(500)),
            projection("Misc", None, dec!(0), dec!(50)),
        ]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].projected_total, dec!(1200));
        assert!(rows[0].over_budget);
        assert_eq!(rows[1].projected_total, dec!(800));
        assert!(!rows[1].over_budget);
        assert!(!rows[2].over_budget);
        assert_eq!(rows[2].allocated, None);
    }

    #[test]
    fn test_validate_allocation() {
        assert!(BudgetLedger::validate_allocation(dec!(0)).is_ok());
        assert!(BudgetLedger::validate_allocation(dec!(1500.50)).is_ok());
        assert!(matches!(
            BudgetLedger::validate_allocation(dec!(-1)),
            Err(BudgetError::NegativeAllocation(_))
        ));
    }

    #[test]
    fn test_validate_spend() {
        assert!(BudgetLedger::validate_spend(dec!(0)).is_ok());
        assert!(matches!(
            BudgetLedger::validate_spend(dec!(-0.01)),
            Err(BudgetError::NegativeSpend(_))
        ));
    }
}
