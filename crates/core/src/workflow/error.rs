//! Workflow error types for the report lifecycle.
//!
//! This module defines all error types that can occur during workflow
//! operations such as status transitions, escalations, and resubmission.

use rust_decimal::Decimal;
use thiserror::Error;

use cems_shared::types::ReportId;

use crate::report::types::ReportStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ReportStatus,
        /// The attempted target status.
        to: ReportStatus,
    },

    /// Rejection remarks are required but not provided.
    #[error("Rejection remarks are required")]
    RemarksRequired,

    /// An inline reallocation carried a negative allocation.
    #[error("Reallocation for {category} must not be negative (got {allocated})")]
    NegativeReallocation {
        /// The category being reallocated.
        category: String,
        /// The rejected allocation.
        allocated: Decimal,
    },

    /// An inline reallocation carried a blank category.
    #[error("Reallocation category must not be blank")]
    ReallocationCategoryRequired,

    /// Report not found.
    #[error("Report {0} not found")]
    ReportNotFound(ReportId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. } => 409,
            Self::RemarksRequired
            | Self::NegativeReallocation { .. }
            | Self::ReallocationCategoryRequired => 400,
            Self::ReportNotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::RemarksRequired => "REMARKS_REQUIRED",
            Self::NegativeReallocation { .. } => "NEGATIVE_REALLOCATION",
            Self::ReallocationCategoryRequired => "REALLOCATION_CATEGORY_REQUIRED",
            Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            from: ReportStatus::Approved,
            to: ReportStatus::Submitted,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("approved"));
        assert!(err.to_string().contains("submitted"));
    }

    #[test]
    fn test_remarks_required_error() {
        let err = WorkflowError::RemarksRequired;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "REMARKS_REQUIRED");
    }

    #[test]
    fn test_negative_reallocation_error() {
        let err = WorkflowError::NegativeReallocation {
            category: "Fuel".to_string(),
            allocated: dec!(-100),
        };
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Fuel"));
    }

    #[test]
    fn test_report_not_found_error() {
        let err = WorkflowError::ReportNotFound(ReportId::new());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "REPORT_NOT_FOUND");
    }
}
