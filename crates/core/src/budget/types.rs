//! Budget data types.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cems_shared::types::BudgetId;

/// A budget row: one category with its allocation and running spend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    /// Budget row ID.
    pub id: BudgetId,
    /// Category name (unique key).
    pub category: String,
    /// Allocated amount for the category.
    pub allocated: Decimal,
    /// Running spend total. Monotonically increased by spend posting,
    /// never decreased automatically.
    pub spent: Decimal,
}

impl BudgetSnapshot {
    /// Returns the unspent remainder of the allocation.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        self.allocated - self.spent
    }
}

/// A calendar-month window with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    /// First day of the month.
    pub start: NaiveDate,
    /// Last day of the month.
    pub end: NaiveDate,
}

impl MonthWindow {
    /// Returns the calendar-month window containing `date`.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .unwrap_or(start);
        Self { start, end }
    }

    /// Returns true if the given date falls within this window.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Monthly projection for one category of a report under evaluation.
///
/// `month_spent` excludes the evaluated report's own items so that
/// re-evaluation on edit does not double-count them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProjection {
    /// Category name.
    pub category: String,
    /// Allocation for the category; `None` when no budget row exists
    /// (treated as "no limit").
    pub allocated: Option<Decimal>,
    /// Sum of other reports' item amounts in this category this month.
    pub month_spent: Decimal,
    /// The evaluated report's own total for this category.
    pub report_amount: Decimal,
}

/// Per-category exceedance breakdown for a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryExceedance {
    /// Category name.
    pub category: String,
    /// Allocation, if a budget row exists.
    pub allocated: Option<Decimal>,
    /// Monthly spend excluding the evaluated report.
    pub month_spent: Decimal,
    /// The evaluated report's own total for this category.
    pub report_amount: Decimal,
    /// `month_spent + report_amount`.
    pub projected_total: Decimal,
    /// True when the projection strictly exceeds the allocation.
    pub over_budget: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_remaining() {
        let budget = BudgetSnapshot {
            id: BudgetId::new(),
            category: "Fuel".to_string(),
            allocated: dec!(1000),
            spent: dec!(300),
        };
        assert_eq!(budget.remaining(), dec!(700));
    }

    #[test]
    fn test_month_window_mid_year() {
        let window = MonthWindow::for_date(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
    }

    #[test]
    fn test_month_window_december_wraps_year() {
        let window = MonthWindow::for_date(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap());
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_month_window_february_leap_year() {
        let window = MonthWindow::for_date(NaiveDate::from_ymd_opt(2028, 2, 10).unwrap());
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
    }

    #[test]
    fn test_contains_date_inclusive_bounds() {
        let window = MonthWindow::for_date(NaiveDate::from_ymd_opt(2026, 4, 15).unwrap());
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()));
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2026, 4, 30).unwrap()));
        assert!(!window.contains_date(NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()));
        assert!(!window.contains_date(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()));
    }
}
