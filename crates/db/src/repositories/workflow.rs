//! Workflow repository for report state transitions.
//!
//! Each transition re-reads the report inside its transaction with a row
//! lock, validates the move through the core engine, and applies the
//! status change, flag updates, ledger spend, and approval insert as one
//! atomic unit. Concurrent operations on the same report serialize on
//! the lock.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use cems_core::workflow::{
    ApprovalRecord, BudgetReallocation, WorkflowAction, WorkflowEngine, WorkflowError,
};
use cems_shared::types::{ReportId, UserId};

use crate::entities::{approvals, expense_reports, sea_orm_active_enums};
use crate::repositories::budget::BudgetRepository;
use crate::repositories::report::category_totals_of;

/// Workflow repository for report state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Manager approves a submitted report.
    ///
    /// Within budget the report becomes `Approved`; over budget it
    /// escalates to the CEO. Ledger spend posts in the same transaction
    /// when not yet posted for this report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not found, is not `Submitted`,
    /// or the database operation fails.
    pub async fn approve_as_manager(
        &self,
        report_id: Uuid,
        approved_by: Uuid,
        remarks: Option<String>,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let report = fetch_locked(&txn, report_id).await?;

        let action = WorkflowEngine::manager_approve(
            report.status.to_core(),
            report.budget_check.to_core(),
            ReportId::from_uuid(report_id),
            UserId::from_uuid(approved_by),
            remarks,
        )?;

        let WorkflowAction::ManagerApprove {
            new_status,
            forwarded_to_ceo,
            post_spend,
            record,
        } = action
        else {
            return Err(WorkflowError::Database(
                "unexpected action for manager approval".to_string(),
            ));
        };

        let should_post = post_spend && !report.spend_posted;
        if should_post {
            post_report_spend(&txn, report_id).await?;
        }

        let now = Utc::now().into();
        let mut active: expense_reports::ActiveModel = report.into();
        active.status = Set(sea_orm_active_enums::ReportStatus::from_core(new_status));
        active.forwarded_to_ceo = Set(forwarded_to_ceo);
        if should_post {
            active.spend_posted = Set(true);
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(db_err)?;

        insert_approval(&txn, &record).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Manager rejects a submitted report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not found, is not `Submitted`,
    /// remarks are blank, or the database operation fails.
    pub async fn reject_as_manager(
        &self,
        report_id: Uuid,
        rejected_by: Uuid,
        remarks: String,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let report = fetch_locked(&txn, report_id).await?;

        let action = WorkflowEngine::manager_reject(
            report.status.to_core(),
            ReportId::from_uuid(report_id),
            UserId::from_uuid(rejected_by),
            remarks,
        )?;

        let updated = apply_decision(&txn, report, &action).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Manager escalates a submitted report to the CEO without deciding.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not found, is not `Submitted`,
    /// or the database operation fails.
    pub async fn forward_to_ceo(
        &self,
        report_id: Uuid,
        forwarded_by: Uuid,
        remarks: Option<String>,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let report = fetch_locked(&txn, report_id).await?;

        let action = WorkflowEngine::forward_to_ceo(
            report.status.to_core(),
            ReportId::from_uuid(report_id),
            UserId::from_uuid(forwarded_by),
            remarks,
        )?;

        let WorkflowAction::ForwardToCeo { new_status, record } = action else {
            return Err(WorkflowError::Database(
                "unexpected action for escalation".to_string(),
            ));
        };

        let now = Utc::now().into();
        let mut active: expense_reports::ActiveModel = report.into();
        active.status = Set(sea_orm_active_enums::ReportStatus::from_core(new_status));
        active.forwarded_to_ceo = Set(true);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(db_err)?;

        insert_approval(&txn, &record).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// CEO approves an escalated report, optionally reallocating budget
    /// categories in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not found, is not
    /// `PendingCeoApproval`, a reallocation is invalid, or the database
    /// operation fails.
    pub async fn approve_as_ceo(
        &self,
        report_id: Uuid,
        approved_by: Uuid,
        remarks: Option<String>,
        reallocations: Vec<BudgetReallocation>,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let report = fetch_locked(&txn, report_id).await?;

        let action = WorkflowEngine::ceo_approve(
            report.status.to_core(),
            ReportId::from_uuid(report_id),
            UserId::from_uuid(approved_by),
            remarks,
            reallocations,
        )?;

        let WorkflowAction::CeoApprove {
            new_status,
            reallocations,
            record,
        } = action
        else {
            return Err(WorkflowError::Database(
                "unexpected action for CEO approval".to_string(),
            ));
        };

        for reallocation in &reallocations {
            BudgetRepository::reallocate(&txn, &reallocation.category, reallocation.allocated)
                .await
                .map_err(|e| WorkflowError::Database(e.to_string()))?;
        }

        let now = Utc::now().into();
        let mut active: expense_reports::ActiveModel = report.into();
        active.status = Set(sea_orm_active_enums::ReportStatus::from_core(new_status));
        active.ceo_approved = Set(true);
        active.forwarded_to_ceo = Set(false);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(db_err)?;

        insert_approval(&txn, &record).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// CEO rejects an escalated report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report is not found, is not
    /// `PendingCeoApproval`, remarks are blank, or the database
    /// operation fails.
    pub async fn reject_as_ceo(
        &self,
        report_id: Uuid,
        rejected_by: Uuid,
        remarks: String,
    ) -> Result<expense_reports::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let report = fetch_locked(&txn, report_id).await?;

        let action = WorkflowEngine::ceo_reject(
            report.status.to_core(),
            ReportId::from_uuid(report_id),
            UserId::from_uuid(rejected_by),
            remarks,
        )?;

        let WorkflowAction::CeoReject { new_status, record } = action else {
            return Err(WorkflowError::Database(
                "unexpected action for CEO rejection".to_string(),
            ));
        };

        let now = Utc::now().into();
        let mut active: expense_reports::ActiveModel = report.into();
        active.status = Set(sea_orm_active_enums::ReportStatus::from_core(new_status));
        active.ceo_approved = Set(false);
        active.forwarded_to_ceo = Set(false);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await.map_err(db_err)?;

        insert_approval(&txn, &record).await?;

        txn.commit().await.map_err(db_err)?;
        Ok(updated)
    }

    /// Reports awaiting manager review, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_for_manager(
        &self,
    ) -> Result<Vec<expense_reports::Model>, WorkflowError> {
        let reports = expense_reports::Entity::find()
            .filter(
                expense_reports::Column::Status.eq(sea_orm_active_enums::ReportStatus::Submitted),
            )
            .order_by_desc(expense_reports::Column::SubmissionDate)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(reports)
    }

    /// Reports awaiting CEO review, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_for_ceo(&self) -> Result<Vec<expense_reports::Model>, WorkflowError> {
        let reports = expense_reports::Entity::find()
            .filter(
                expense_reports::Column::Status
                    .eq(sea_orm_active_enums::ReportStatus::PendingCeoApproval),
            )
            .order_by_desc(expense_reports::Column::SubmissionDate)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(reports)
    }

    /// Reports eligible for the finance reimbursement queue: approved,
    /// unreimbursed, and either within budget or CEO-approved.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reimbursement_queue(
        &self,
    ) -> Result<Vec<expense_reports::Model>, WorkflowError> {
        let reports = expense_reports::Entity::find()
            .filter(
                expense_reports::Column::Status.eq(sea_orm_active_enums::ReportStatus::Approved),
            )
            .filter(expense_reports::Column::Reimbursed.eq(false))
            .filter(
                Condition::any()
                    .add(
                        expense_reports::Column::BudgetCheck
                            .eq(sea_orm_active_enums::BudgetCheckStatus::WithinBudget),
                    )
                    .add(expense_reports::Column::CeoApproved.eq(true)),
            )
            .order_by_desc(expense_reports::Column::SubmissionDate)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(reports)
    }

    /// The active (non-superseded) approval trail for a report, in
    /// decision order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn approval_trail(
        &self,
        report_id: Uuid,
    ) -> Result<Vec<approvals::Model>, WorkflowError> {
        let trail = approvals::Entity::find()
            .filter(approvals::Column::ReportId.eq(report_id))
            .filter(approvals::Column::Superseded.eq(false))
            .order_by_asc(approvals::Column::DecidedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(trail)
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Maps a database error into the workflow error space.
fn db_err(e: sea_orm::DbErr) -> WorkflowError {
    WorkflowError::Database(e.to_string())
}

/// Fetches a report inside the transaction with a row lock, serializing
/// concurrent transitions on the same report.
async fn fetch_locked(
    txn: &DatabaseTransaction,
    report_id: Uuid,
) -> Result<expense_reports::Model, WorkflowError> {
    expense_reports::Entity::find_by_id(report_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| WorkflowError::ReportNotFound(ReportId::from_uuid(report_id)))
}

/// Applies a plain rejection action: status update plus approval insert.
async fn apply_decision(
    txn: &DatabaseTransaction,
    report: expense_reports::Model,
    action: &WorkflowAction,
) -> Result<expense_reports::Model, WorkflowError> {
    let now = Utc::now().into();
    let mut active: expense_reports::ActiveModel = report.into();
    active.status = Set(sea_orm_active_enums::ReportStatus::from_core(
        action.new_status(),
    ));
    active.updated_at = Set(now);
    let updated = active.update(txn).await.map_err(db_err)?;

    if let Some(record) = action.record() {
        insert_approval(txn, record).await?;
    }

    Ok(updated)
}

/// Appends an approval record.
pub(crate) async fn insert_approval(
    txn: &DatabaseTransaction,
    record: &ApprovalRecord,
) -> Result<(), WorkflowError> {
    let row = approvals::ActiveModel {
        id: Set(Uuid::new_v4()),
        report_id: Set(record.report_id.into_inner()),
        approver_id: Set(record.approver_id.into_inner()),
        stage: Set(sea_orm_active_enums::ApprovalStage::from_core(record.stage)),
        decision: Set(sea_orm_active_enums::ApprovalDecision::from_core(
            record.decision,
        )),
        remarks: Set(record.remarks.clone()),
        decided_at: Set(record.decided_at.into()),
        superseded: Set(false),
        created_at: Set(Utc::now().into()),
    };
    row.insert(txn).await.map_err(db_err)?;
    Ok(())
}

/// Posts ledger spend for every category of the report's items, inside
/// the caller's transaction.
pub(crate) async fn post_report_spend(
    txn: &DatabaseTransaction,
    report_id: Uuid,
) -> Result<(), WorkflowError> {
    let items = crate::entities::expense_items::Entity::find()
        .filter(crate::entities::expense_items::Column::ReportId.eq(report_id))
        .all(txn)
        .await
        .map_err(db_err)?;

    for (category, amount) in category_totals_of(&items) {
        BudgetRepository::apply_spend(txn, &category, amount)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;
    }

    Ok(())
}
