//! `SeaORM` Entity for the expense_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub report_id: Uuid,
    pub category: String,
    pub amount: Decimal,
    pub expense_date: Date,
    pub description: Option<String>,
    pub receipt_ref: Option<String>,
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
