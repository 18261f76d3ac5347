//! `SeaORM` entity definitions.

pub mod approvals;
pub mod budgets;
pub mod expense_items;
pub mod expense_reports;
pub mod reimbursement_payments;
pub mod sea_orm_active_enums;
