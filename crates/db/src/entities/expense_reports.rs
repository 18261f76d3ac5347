//! `SeaORM` Entity for the expense_reports table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{BudgetCheckStatus, ReportStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub submission_date: DateTimeWithTimeZone,
    pub status: ReportStatus,
    pub budget_check: BudgetCheckStatus,
    pub total_amount: Decimal,
    pub forwarded_to_ceo: bool,
    pub ceo_approved: bool,
    pub reimbursed: bool,
    pub spend_posted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::expense_items::Entity")]
    ExpenseItems,
    #[sea_orm(has_many = "super::approvals::Entity")]
    Approvals,
    #[sea_orm(has_many = "super::reimbursement_payments::Entity")]
    ReimbursementPayments,
}

impl Related<super::expense_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseItems.def()
    }
}

impl Related<super::approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approvals.def()
    }
}

impl Related<super::reimbursement_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReimbursementPayments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
