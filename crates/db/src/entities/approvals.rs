//! `SeaORM` Entity for the approvals table.
//!
//! Records are append-only. Resubmission marks a report's prior records
//! superseded instead of deleting them, preserving the full audit trail.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{ApprovalDecision, ApprovalStage};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub report_id: Uuid,
    pub approver_id: Uuid,
    pub stage: ApprovalStage,
    pub decision: ApprovalDecision,
    pub remarks: Option<String>,
    pub decided_at: DateTimeWithTimeZone,
    pub superseded: bool,
    pub created_at: DateTimeWithTimeZone,
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
