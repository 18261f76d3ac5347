//! Budget repository for ledger database operations.
//!
//! The ledger answers one question for the workflow: "would adding this
//! report's amounts to each category's current-month spend exceed the
//! allocation?" Spend application and reallocation run inside the
//! caller's transaction so they commit atomically with the status change
//! that realizes them.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use cems_core::budget::{
    BudgetError as LedgerRuleError, BudgetLedger, BudgetSnapshot, CategoryProjection, MonthWindow,
};
use cems_shared::AppError;
use cems_shared::types::BudgetId;

use crate::entities::{budgets, expense_items};

/// Error types for budget operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// No budget row exists for the category.
    #[error("Budget category not found: {0}")]
    NotFound(String),

    /// Allocation or spend amounts must be non-negative.
    #[error(transparent)]
    Rule(#[from] LedgerRuleError),

    /// Category name is required.
    #[error("Budget category must not be blank")]
    CategoryRequired,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BudgetError> for AppError {
    fn from(e: BudgetError) -> Self {
        match e {
            BudgetError::NotFound(category) => {
                Self::NotFound(format!("Budget category not found: {category}"))
            }
            BudgetError::Rule(rule) => Self::Validation(rule.to_string()),
            BudgetError::CategoryRequired => {
                Self::Validation("Budget category must not be blank".to_string())
            }
            BudgetError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Budget repository for ledger reads and allocation upserts.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists all budget rows ordered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<BudgetSnapshot>, BudgetError> {
        let rows = budgets::Entity::find()
            .order_by_asc(budgets::Column::Category)
            .all(&self.db)
            .await?;
        Ok(rows.iter().map(to_snapshot).collect())
    }

    /// Finds a budget row by its trimmed category key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_category(
        &self,
        category: &str,
    ) -> Result<Option<BudgetSnapshot>, BudgetError> {
        let row = find_model(&self.db, category).await?;
        Ok(row.as_ref().map(to_snapshot))
    }

    /// Creates or updates the allocation for a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is blank, the allocation is
    /// negative, or the database operation fails.
    pub async fn upsert_allocation(
        &self,
        category: &str,
        allocated: Decimal,
    ) -> Result<BudgetSnapshot, BudgetError> {
        let row = Self::reallocate(&self.db, category, allocated).await?;
        Ok(row)
    }

    /// Assembles monthly projections for a report's category totals.
    ///
    /// `exclude_report` omits the evaluated report's own items from the
    /// monthly sums so re-evaluation on edit does not double-count them.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn projections_for(
        &self,
        category_totals: &[(String, Decimal)],
        window: MonthWindow,
        exclude_report: Option<Uuid>,
    ) -> Result<Vec<CategoryProjection>, BudgetError> {
        Self::projections_on(&self.db, category_totals, window, exclude_report).await
    }

    /// Like [`Self::projections_for`] but usable inside a caller's
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn projections_on<C: ConnectionTrait>(
        conn: &C,
        category_totals: &[(String, Decimal)],
        window: MonthWindow,
        exclude_report: Option<Uuid>,
    ) -> Result<Vec<CategoryProjection>, BudgetError> {
        let mut projections = Vec::with_capacity(category_totals.len());
        for (category, report_amount) in category_totals {
            let allocated = find_model(conn, category).await?.map(|b| b.allocated);

            let month_spent =
                Self::month_category_spend(conn, category, window, exclude_report).await?;

            projections.push(CategoryProjection {
                category: category.clone(),
                allocated,
                month_spent,
                report_amount: *report_amount,
            });
        }
        Ok(projections)
    }

    /// Sums expense-item amounts for a category dated within the window,
    /// excluding the evaluated report's own items.
    ///
    /// Categories are stored trimmed, so the equality filter matches the
    /// trimmed key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn month_category_spend<C: ConnectionTrait>(
        conn: &C,
        category: &str,
        window: MonthWindow,
        exclude_report: Option<Uuid>,
    ) -> Result<Decimal, BudgetError> {
        let mut query = expense_items::Entity::find()
            .filter(expense_items::Column::Category.eq(category.trim()))
            .filter(expense_items::Column::ExpenseDate.gte(window.start))
            .filter(expense_items::Column::ExpenseDate.lte(window.end));

        if let Some(report_id) = exclude_report {
            query = query.filter(expense_items::Column::ReportId.ne(report_id));
        }

        let items = query.all(conn).await?;
        Ok(items.iter().map(|i| i.amount).sum())
    }

    /// Increases a category's running spend inside the caller's
    /// transaction.
    ///
    /// A missing budget row is a no-op: the category has no limit and
    /// nothing to track.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative or the database
    /// operation fails.
    pub async fn apply_spend<C: ConnectionTrait>(
        conn: &C,
        category: &str,
        amount: Decimal,
    ) -> Result<(), BudgetError> {
        BudgetLedger::validate_spend(amount)?;

        if let Some(budget) = find_model(conn, category).await? {
            let spent = budget.spent + amount;
            let mut active: budgets::ActiveModel = budget.into();
            active.spent = Set(spent);
            active.updated_at = Set(Utc::now().into());
            active.update(conn).await?;
        }

        Ok(())
    }

    /// Replaces a category's allocation inside the caller's transaction,
    /// creating the row when the category has no budget yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is blank, the allocation is
    /// negative, or the database operation fails.
    pub async fn reallocate<C: ConnectionTrait>(
        conn: &C,
        category: &str,
        allocated: Decimal,
    ) -> Result<BudgetSnapshot, BudgetError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(BudgetError::CategoryRequired);
        }
        BudgetLedger::validate_allocation(allocated)?;

        let now = Utc::now().into();
        let row = match find_model(conn, category).await? {
            Some(existing) => {
                let mut active: budgets::ActiveModel = existing.into();
                active.allocated = Set(allocated);
                active.updated_at = Set(now);
                active.update(conn).await?
            }
            None => {
                let created = budgets::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    category: Set(category.to_string()),
                    allocated: Set(allocated),
                    spent: Set(Decimal::ZERO),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                created.insert(conn).await?
            }
        };
        Ok(to_snapshot(&row))
    }
}

/// Fetches a budget row by its trimmed category key.
async fn find_model<C: ConnectionTrait>(
    conn: &C,
    category: &str,
) -> Result<Option<budgets::Model>, DbErr> {
    budgets::Entity::find()
        .filter(budgets::Column::Category.eq(category.trim()))
        .one(conn)
        .await
}

/// Converts a budget row into the core snapshot.
fn to_snapshot(model: &budgets::Model) -> BudgetSnapshot {
    BudgetSnapshot {
        id: BudgetId::from_uuid(model.id),
        category: model.category.clone(),
        allocated: model.allocated,
        spent: model.spent,
    }
}
