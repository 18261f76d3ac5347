//! Reimbursement error types.

use thiserror::Error;

use crate::report::types::ReportStatus;

/// Errors that can occur during reimbursement operations.
#[derive(Debug, Error)]
pub enum ReimbursementError {
    /// Initiation attempted while the active session already reports paid.
    #[error("Active payment session already reports paid")]
    AlreadyPaid,

    /// The report is not eligible for reimbursement.
    #[error("Report in status {status} is not eligible for reimbursement")]
    NotEligible {
        /// The report's current status.
        status: ReportStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ReimbursementError::AlreadyPaid.to_string(),
            "Active payment session already reports paid"
        );
        let err = ReimbursementError::NotEligible {
            status: ReportStatus::Submitted,
        };
        assert!(err.to_string().contains("submitted"));
    }
}
