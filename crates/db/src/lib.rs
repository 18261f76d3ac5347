//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//!
//! Every workflow mutation executes as one database transaction covering
//! the report row, its items, the budget rows it touches, and the new
//! approval record; concurrent operations on the same report serialize
//! on a row lock taken inside that transaction.

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    BudgetRepository, ReimbursementRepository, ReportRepository, WorkflowRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
