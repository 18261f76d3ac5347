//! `SeaORM` Entity for the reimbursement_payments table.
//!
//! At most one active (non-expired) session exists per report;
//! re-initiation overwrites the active row rather than duplicating it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reimbursement_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub report_id: Uuid,
    pub session_id: String,
    pub checkout_url: String,
    pub status: String,
    pub amount: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub processed_by: Option<Uuid>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expense_reports::Entity",
        from = "Column::ReportId",
        to = "super::expense_reports::Column::Id"
    )]
    ExpenseReports,
}

impl Related<super::expense_reports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseReports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
