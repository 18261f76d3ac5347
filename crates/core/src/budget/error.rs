//! Budget error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during budget operations.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Allocation amounts must be non-negative.
    #[error("Allocation {0} must not be negative")]
    NegativeAllocation(Decimal),

    /// Spend amounts must be non-negative.
    #[error("Spend amount {0} must not be negative")]
    NegativeSpend(Decimal),

    /// Category name is required.
    #[error("Budget category must not be blank")]
    CategoryRequired,
}
