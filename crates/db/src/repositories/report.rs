//! Report repository for submission and resubmission.
//!
//! Submission computes the total and the monthly budget check through
//! the core ledger, then inserts the report and its items in one
//! transaction. Resubmission recomputes both exactly the same way, but
//! additionally clears the escalation/reimbursement flags and supersedes
//! the prior approval trail.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use cems_core::budget::{BudgetLedger, CategoryExceedance, MonthWindow};
use cems_core::report::{
    ExpenseItem, ExpenseReport, NewExpenseItem, ReportError as ReportRuleError, ReportService,
};
use cems_shared::AppError;
use cems_shared::types::{ItemId, ReportId, UserId};

use crate::entities::{approvals, expense_items, expense_reports, sea_orm_active_enums};
use crate::repositories::budget::{BudgetError, BudgetRepository};

/// Error types for report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Report not found.
    #[error("Report not found: {0}")]
    NotFound(Uuid),

    /// Validation or state rule violated.
    #[error(transparent)]
    Rule(#[from] ReportRuleError),

    /// Budget ledger failure.
    #[error(transparent)]
    Budget(#[from] BudgetError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        match e {
            ReportError::NotFound(id) => Self::NotFound(format!("Report {id} not found")),
            ReportError::Rule(rule @ ReportRuleError::NotEditable { .. }) => {
                Self::InvalidState(rule.to_string())
            }
            ReportError::Rule(rule) => Self::Validation(rule.to_string()),
            ReportError::Budget(e) => e.into(),
            ReportError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// A report row with its items.
#[derive(Debug, Clone)]
pub struct ReportWithItems {
    /// Report record.
    pub report: expense_reports::Model,
    /// Items owned by the report, in insertion order.
    pub items: Vec<expense_items::Model>,
}

impl ReportWithItems {
    /// Converts the rows into the core report snapshot.
    #[must_use]
    pub fn to_core(&self) -> ExpenseReport {
        ExpenseReport {
            id: ReportId::from_uuid(self.report.id),
            user_id: UserId::from_uuid(self.report.user_id),
            submission_date: self.report.submission_date.with_timezone(&Utc),
            status: self.report.status.to_core(),
            budget_check: self.report.budget_check.to_core(),
            total_amount: self.report.total_amount,
            forwarded_to_ceo: self.report.forwarded_to_ceo,
            ceo_approved: self.report.ceo_approved,
            reimbursed: self.report.reimbursed,
            spend_posted: self.report.spend_posted,
            items: self
                .items
                .iter()
                .map(|item| ExpenseItem {
                    id: ItemId::from_uuid(item.id),
                    report_id: ReportId::from_uuid(item.report_id),
                    category: item.category.clone(),
                    amount: item.amount,
                    expense_date: item.expense_date,
                    description: item.description.clone(),
                    receipt_ref: item.receipt_ref.clone(),
                })
                .collect(),
        }
    }
}

/// Report repository for submission lifecycle operations.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Submits a new expense report.
    ///
    /// Computes the total and the budget check against the calendar
    /// month containing `as_of`, then inserts the report and its items
    /// atomically with `status = Submitted`.
    ///
    /// # Errors
    ///
    /// Returns an error if item validation fails or a database
    /// operation fails.
    pub async fn submit(
        &self,
        user_id: Uuid,
        items: Vec<NewExpenseItem>,
        as_of: NaiveDate,
    ) -> Result<ReportWithItems, ReportError> {
        ReportService::validate_items(&items)?;

        let total_amount = ReportService::total_amount(&items);
        let category_totals = ReportService::category_totals(&items);
        let window = MonthWindow::for_date(as_of);

        let projections =
            BudgetRepository::projections_on(&self.db, &category_totals, window, None).await?;
        let budget_check = BudgetLedger::classify(&projections);

        let txn = self.db.begin().await?;

        let now = Utc::now().into();
        let report_id = Uuid::new_v4();
        let report = expense_reports::ActiveModel {
            id: Set(report_id),
            user_id: Set(user_id),
            submission_date: Set(now),
            status: Set(sea_orm_active_enums::ReportStatus::Submitted),
            budget_check: Set(sea_orm_active_enums::BudgetCheckStatus::from_core(
                budget_check,
            )),
            total_amount: Set(total_amount),
            forwarded_to_ceo: Set(false),
            ceo_approved: Set(false),
            reimbursed: Set(false),
            spend_posted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let report = report.insert(&txn).await?;

        let item_models = item_active_models(report_id, &items, now);
        expense_items::Entity::insert_many(item_models).exec(&txn).await?;

        let stored_items = items_of(&txn, report_id).await?;

        txn.commit().await?;

        Ok(ReportWithItems {
            report,
            items: stored_items,
        })
    }

    /// Resubmits an edited report.
    ///
    /// Only legal while the report is not `Approved`. Recomputes the
    /// total and budget check exactly as `submit` (excluding this
    /// report's own items from the monthly sums), replaces the items,
    /// clears `forwarded_to_ceo`, `ceo_approved`, `reimbursed`, and
    /// `spend_posted`, and supersedes the prior approval trail, all in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for an unknown report,
    /// `ReportError::Rule` for an approved report or invalid items, and
    /// `ReportError::Database` on database failure.
    pub async fn resubmit(
        &self,
        report_id: Uuid,
        items: Vec<NewExpenseItem>,
        as_of: NaiveDate,
    ) -> Result<ReportWithItems, ReportError> {
        ReportService::validate_items(&items)?;

        let txn = self.db.begin().await?;

        let report = expense_reports::Entity::find_by_id(report_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReportError::NotFound(report_id))?;

        ReportService::ensure_editable(report.status.to_core())?;

        let total_amount = ReportService::total_amount(&items);
        let category_totals = ReportService::category_totals(&items);
        let window = MonthWindow::for_date(as_of);

        let projections =
            BudgetRepository::projections_on(&txn, &category_totals, window, Some(report_id))
                .await?;
        let budget_check = BudgetLedger::classify(&projections);

        // Replace the items wholesale.
        expense_items::Entity::delete_many()
            .filter(expense_items::Column::ReportId.eq(report_id))
            .exec(&txn)
            .await?;

        let now = Utc::now().into();
        let item_models = item_active_models(report_id, &items, now);
        expense_items::Entity::insert_many(item_models).exec(&txn).await?;

        // The approval trail restarts; prior records stay for audit.
        approvals::Entity::update_many()
            .col_expr(approvals::Column::Superseded, Expr::value(true))
            .filter(approvals::Column::ReportId.eq(report_id))
            .filter(approvals::Column::Superseded.eq(false))
            .exec(&txn)
            .await?;

        let mut active: expense_reports::ActiveModel = report.into();
        active.submission_date = Set(now);
        active.status = Set(sea_orm_active_enums::ReportStatus::Submitted);
        active.budget_check = Set(sea_orm_active_enums::BudgetCheckStatus::from_core(
            budget_check,
        ));
        active.total_amount = Set(total_amount);
        active.forwarded_to_ceo = Set(false);
        active.ceo_approved = Set(false);
        active.reimbursed = Set(false);
        active.spend_posted = Set(false);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        let stored_items = items_of(&txn, report_id).await?;

        txn.commit().await?;

        Ok(ReportWithItems {
            report: updated,
            items: stored_items,
        })
    }

    /// Fetches a report with its items.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for an unknown report.
    pub async fn find_with_items(&self, report_id: Uuid) -> Result<ReportWithItems, ReportError> {
        let report = expense_reports::Entity::find_by_id(report_id)
            .one(&self.db)
            .await?
            .ok_or(ReportError::NotFound(report_id))?;

        let items = items_of(&self.db, report_id).await?;

        Ok(ReportWithItems { report, items })
    }

    /// Lists a user's reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<expense_reports::Model>, ReportError> {
        let reports = expense_reports::Entity::find()
            .filter(expense_reports::Column::UserId.eq(user_id))
            .order_by_desc(expense_reports::Column::SubmissionDate)
            .all(&self.db)
            .await?;
        Ok(reports)
    }

    /// Computes the per-category exceedance breakdown for a report
    /// against the calendar month containing `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NotFound` for an unknown report.
    pub async fn exceedance(
        &self,
        report_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<Vec<CategoryExceedance>, ReportError> {
        let ReportWithItems { items, .. } = self.find_with_items(report_id).await?;

        let category_totals = category_totals_of(&items);
        let window = MonthWindow::for_date(as_of);
        let projections =
            BudgetRepository::projections_on(&self.db, &category_totals, window, Some(report_id))
                .await?;

        Ok(BudgetLedger::exceedance(projections))
    }
}

/// Builds item active models for insertion. Categories are stored
/// trimmed so ledger lookups match the budget key.
fn item_active_models(
    report_id: Uuid,
    items: &[NewExpenseItem],
    now: sea_orm::prelude::DateTimeWithTimeZone,
) -> Vec<expense_items::ActiveModel> {
    items
        .iter()
        .map(|item| expense_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            report_id: Set(report_id),
            category: Set(item.category.trim().to_string()),
            amount: Set(item.amount),
            expense_date: Set(item.expense_date),
            description: Set(item.description.clone()),
            receipt_ref: Set(item.receipt_ref.clone()),
            created_at: Set(now),
        })
        .collect()
}

/// Fetches a report's items in insertion order.
async fn items_of<C: sea_orm::ConnectionTrait>(
    conn: &C,
    report_id: Uuid,
) -> Result<Vec<expense_items::Model>, DbErr> {
    expense_items::Entity::find()
        .filter(expense_items::Column::ReportId.eq(report_id))
        .order_by_asc(expense_items::Column::CreatedAt)
        .all(conn)
        .await
}

/// Sums stored item amounts per category, in first-occurrence order.
pub(crate) fn category_totals_of(items: &[expense_items::Model]) -> Vec<(String, Decimal)> {
    let mut totals: Vec<(String, Decimal)> = Vec::new();
    for item in items {
        let category = item.category.trim();
        match totals.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total += item.amount,
            None => totals.push((category.to_string(), item.amount)),
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn stored_item(category: &str, amount: Decimal) -> expense_items::Model {
        expense_items::Model {
            id: Uuid::new_v4(),
            report_id: Uuid::new_v4(),
            category: category.to_string(),
            amount,
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            description: None,
            receipt_ref: None,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_category_totals_of_accumulates_per_category() {
        let items = vec![
            stored_item("Fuel", dec!(100)),
            stored_item("Travel", dec!(50)),
            stored_item("Fuel", dec!(20.50)),
        ];
        assert_eq!(
            category_totals_of(&items),
            vec![
                ("Fuel".to_string(), dec!(120.50)),
                ("Travel".to_string(), dec!(50)),
            ]
        );
    }

    #[test]
    fn test_to_core_preserves_rows() {
        let report_id = Uuid::new_v4();
        let report = expense_reports::Model {
            id: report_id,
            user_id: Uuid::new_v4(),
            submission_date: Utc::now().into(),
            status: sea_orm_active_enums::ReportStatus::Submitted,
            budget_check: sea_orm_active_enums::BudgetCheckStatus::OverBudget,
            total_amount: dec!(1200),
            forwarded_to_ceo: false,
            ceo_approved: false,
            reimbursed: false,
            spend_posted: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let mut item = stored_item("Fuel", dec!(1200));
        item.report_id = report_id;

        let snapshot = ReportWithItems {
            report,
            items: vec![item],
        }
        .to_core();

        assert_eq!(snapshot.id.into_inner(), report_id);
        assert_eq!(snapshot.status, cems_core::report::ReportStatus::Submitted);
        assert_eq!(
            snapshot.budget_check,
            cems_core::report::BudgetCheckStatus::OverBudget
        );
        assert_eq!(snapshot.total_amount, dec!(1200));
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].category, "Fuel");
        assert_eq!(snapshot.distinct_categories(), vec!["Fuel"]);
    }

    #[test]
    fn test_item_active_models_trim_categories() {
        let items = vec![NewExpenseItem {
            category: "  Fuel  ".to_string(),
            amount: dec!(10),
            expense_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            description: None,
            receipt_ref: None,
        }];
        let models = item_active_models(Uuid::new_v4(), &items, Utc::now().into());
        assert_eq!(models.len(), 1);
        let sea_orm::ActiveValue::Set(category) = &models[0].category else {
            panic!("category not set");
        };
        assert_eq!(category, "Fuel");
    }
}
