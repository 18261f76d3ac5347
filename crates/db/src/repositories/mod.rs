//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Every workflow mutation runs as one transaction.

pub mod budget;
pub mod reimbursement;
pub mod report;
pub mod workflow;

pub use budget::{BudgetError, BudgetRepository};
pub use reimbursement::{ConfirmOutcome, ReimbursementError, ReimbursementRepository};
pub use report::{ReportError, ReportRepository, ReportWithItems};
pub use workflow::WorkflowRepository;
