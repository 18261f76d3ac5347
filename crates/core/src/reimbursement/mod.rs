//! Reimbursement reconciliation for CEMS.
//!
//! Bridges asynchronous external payment confirmations (webhook push,
//! polling refresh, or manual override) into the workflow without
//! double-crediting the budget ledger.
//!
//! # Modules
//!
//! - `types` - Payment session types and confirmation outcomes
//! - `error` - Reimbursement-specific error types
//! - `reconciler` - Idempotent confirmation planning

pub mod error;
pub mod reconciler;
pub mod types;

pub use error::ReimbursementError;
pub use reconciler::Reconciler;
pub use types::{ConfirmationOutcome, PaymentSession, PaymentStatus};
