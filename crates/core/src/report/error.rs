//! Report error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::report::types::ReportStatus;

/// Errors that can occur when building or editing an expense report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A report must contain at least one item.
    #[error("Report must contain at least one expense item")]
    EmptyItems,

    /// An item is missing its category.
    #[error("Item {index} has an empty category")]
    EmptyCategory {
        /// Zero-based index of the offending item.
        index: usize,
    },

    /// An item amount is zero or negative.
    #[error("Item {index} amount {amount} must be positive")]
    NonPositiveAmount {
        /// Zero-based index of the offending item.
        index: usize,
        /// The rejected amount.
        amount: Decimal,
    },

    /// An item amount carries more than 2 decimal places.
    #[error("Item {index} amount {amount} exceeds currency scale (2 decimal places)")]
    InvalidPrecision {
        /// Zero-based index of the offending item.
        index: usize,
        /// The rejected amount.
        amount: Decimal,
    },

    /// Resubmission attempted on an approved report.
    #[error("Report in status {status} cannot be edited; approved reports are immutable")]
    NotEditable {
        /// The report's current status.
        status: ReportStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = ReportError::NonPositiveAmount {
            index: 2,
            amount: dec!(-5),
        };
        assert!(err.to_string().contains("Item 2"));
        assert!(err.to_string().contains("-5"));

        let err = ReportError::NotEditable {
            status: ReportStatus::Approved,
        };
        assert!(err.to_string().contains("approved"));
    }
}
