//! Reimbursement repository bridging external payment confirmations
//! into the workflow.
//!
//! The `reimbursed` check is re-read under a row lock inside the same
//! transaction as the mutation, so two confirmations can never both
//! observe an unreimbursed report: duplicate webhook deliveries, polling
//! refreshes, and manual overrides all collapse into one ledger credit.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use cems_core::reimbursement::{
    ConfirmationOutcome, PaymentSession, PaymentStatus, Reconciler,
    ReimbursementError as ReconcilerRuleError,
};
use cems_core::workflow::{ApprovalDecision, ApprovalRecord, ApprovalStage};
use cems_shared::AppError;
use cems_shared::types::{PaymentId, ReportId, UserId};

use crate::entities::{expense_reports, reimbursement_payments};
use crate::repositories::workflow::{insert_approval, post_report_spend};

/// Error types for reimbursement operations.
#[derive(Debug, thiserror::Error)]
pub enum ReimbursementError {
    /// Report not found.
    #[error("Report not found: {0}")]
    ReportNotFound(Uuid),

    /// No payment session matches the identifier.
    #[error("Payment session not found: {0}")]
    SessionNotFound(String),

    /// Reconciliation rule violated (already paid, not eligible).
    #[error(transparent)]
    Rule(#[from] ReconcilerRuleError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReimbursementError> for AppError {
    fn from(e: ReimbursementError) -> Self {
        match e {
            ReimbursementError::ReportNotFound(id) => {
                Self::NotFound(format!("Report {id} not found"))
            }
            ReimbursementError::SessionNotFound(id) => {
                Self::NotFound(format!("Payment session {id} not found"))
            }
            ReimbursementError::Rule(rule @ ReconcilerRuleError::AlreadyPaid) => {
                Self::AlreadyPaid(rule.to_string())
            }
            ReimbursementError::Rule(rule) => Self::InvalidState(rule.to_string()),
            ReimbursementError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// What a confirmation call actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Non-paid status recorded on the payment row; workflow untouched.
    StatusRecorded,
    /// The report was marked reimbursed by this call.
    Reimbursed,
    /// The report was already reimbursed; nothing changed.
    AlreadySettled,
}

/// Reimbursement repository for session management and confirmation.
#[derive(Debug, Clone)]
pub struct ReimbursementRepository {
    db: DatabaseConnection,
}

impl ReimbursementRepository {
    /// Creates a new reimbursement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the report's active (non-expired) payment session, if
    /// any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_session(
        &self,
        report_id: Uuid,
    ) -> Result<Option<PaymentSession>, ReimbursementError> {
        let session = reimbursement_payments::Entity::find()
            .filter(reimbursement_payments::Column::ReportId.eq(report_id))
            .filter(
                reimbursement_payments::Column::Status.ne(PaymentStatus::Expired.as_str()),
            )
            .order_by_desc(reimbursement_payments::Column::CreatedAt)
            .one(&self.db)
            .await?;
        Ok(session.as_ref().map(to_core_session))
    }

    /// Records a freshly created checkout session for a report,
    /// overwriting the existing active session rather than duplicating
    /// it.
    ///
    /// # Errors
    ///
    /// Returns `ReimbursementError::Rule` when the active session
    /// already reports paid, `ReportNotFound` for an unknown report, and
    /// `Database` on database failure.
    pub async fn record_session(
        &self,
        report_id: Uuid,
        session_id: String,
        checkout_url: String,
        amount: Decimal,
        processed_by: Uuid,
    ) -> Result<PaymentSession, ReimbursementError> {
        let txn = self.db.begin().await?;

        // Lock the report so a racing confirmation serializes with us.
        let _report = fetch_locked(&txn, report_id).await?;

        let active = reimbursement_payments::Entity::find()
            .filter(reimbursement_payments::Column::ReportId.eq(report_id))
            .filter(
                reimbursement_payments::Column::Status.ne(PaymentStatus::Expired.as_str()),
            )
            .one(&txn)
            .await?;

        let snapshot = active.as_ref().map(to_core_session);
        Reconciler::check_initiate(snapshot.as_ref())?;

        let now = Utc::now().into();
        let session = match active {
            Some(existing) => {
                let mut active: reimbursement_payments::ActiveModel = existing.into();
                active.session_id = Set(session_id);
                active.checkout_url = Set(checkout_url);
                active.status = Set(PaymentStatus::Unpaid.as_str().to_string());
                active.amount = Set(amount);
                active.created_at = Set(now);
                active.paid_at = Set(None);
                active.processed_by = Set(Some(processed_by));
                active.updated_at = Set(now);
                active.update(&txn).await?
            }
            None => {
                let row = reimbursement_payments::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    report_id: Set(report_id),
                    session_id: Set(session_id),
                    checkout_url: Set(checkout_url),
                    status: Set(PaymentStatus::Unpaid.as_str().to_string()),
                    amount: Set(amount),
                    created_at: Set(now),
                    paid_at: Set(None),
                    processed_by: Set(Some(processed_by)),
                    updated_at: Set(now),
                };
                row.insert(&txn).await?
            }
        };

        txn.commit().await?;
        Ok(to_core_session(&session))
    }

    /// Applies an external payment confirmation to a report.
    ///
    /// Anything other than `"paid"` only updates the payment row. The
    /// first paid confirmation marks the report reimbursed, stamps
    /// `paid_at`, posts ledger spend when not yet posted, and appends a
    /// finance-stage approval; later confirmations are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `ReportNotFound` for an unknown report and `Database` on
    /// database failure.
    pub async fn confirm_payment(
        &self,
        report_id: Uuid,
        external_status: &str,
        processed_by: Uuid,
    ) -> Result<(expense_reports::Model, ConfirmOutcome), ReimbursementError> {
        let txn = self.db.begin().await?;
        let report = fetch_locked(&txn, report_id).await?;

        let plan =
            Reconciler::plan_confirmation(report.reimbursed, report.spend_posted, external_status);
        let (updated, outcome) =
            apply_confirmation(&txn, report, plan, processed_by, None).await?;

        txn.commit().await?;
        Ok((updated, outcome))
    }

    /// Applies a webhook confirmation addressed by session identifier.
    ///
    /// Unknown sessions are ignored (`Ok(None)`) so replayed or foreign
    /// events cannot fail the webhook endpoint.
    ///
    /// # Errors
    ///
    /// Returns `Database` on database failure.
    pub async fn confirm_by_session(
        &self,
        session_id: &str,
        external_status: &str,
    ) -> Result<Option<(expense_reports::Model, ConfirmOutcome)>, ReimbursementError> {
        let payment = reimbursement_payments::Entity::find()
            .filter(reimbursement_payments::Column::SessionId.eq(session_id))
            .one(&self.db)
            .await?;

        let Some(payment) = payment else {
            return Ok(None);
        };

        let txn = self.db.begin().await?;
        let report = fetch_locked(&txn, payment.report_id).await?;

        // A webhook has no acting operator; attribute the confirmation
        // to the finance user who initiated the session.
        let processed_by = payment.processed_by.unwrap_or_else(Uuid::nil);

        let plan =
            Reconciler::plan_confirmation(report.reimbursed, report.spend_posted, external_status);
        let (updated, outcome) =
            apply_confirmation(&txn, report, plan, processed_by, None).await?;

        txn.commit().await?;
        Ok(Some((updated, outcome)))
    }

    /// Administrative escape hatch: marks a report reimbursed without
    /// consulting the external processor, following the identical
    /// idempotent path as a paid confirmation.
    ///
    /// # Errors
    ///
    /// Returns `ReportNotFound` for an unknown report and `Database` on
    /// database failure.
    pub async fn mark_reimbursed_manual(
        &self,
        report_id: Uuid,
        processed_by: Uuid,
    ) -> Result<(expense_reports::Model, ConfirmOutcome), ReimbursementError> {
        let txn = self.db.begin().await?;
        let report = fetch_locked(&txn, report_id).await?;

        let plan = Reconciler::manual_settlement(report.reimbursed, report.spend_posted);
        let (updated, outcome) = apply_confirmation(
            &txn,
            report,
            plan,
            processed_by,
            Some("Marked reimbursed manually".to_string()),
        )
        .await?;

        txn.commit().await?;
        Ok((updated, outcome))
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Converts a payment row into the core session snapshot.
fn to_core_session(model: &reimbursement_payments::Model) -> PaymentSession {
    PaymentSession {
        id: PaymentId::from_uuid(model.id),
        report_id: ReportId::from_uuid(model.report_id),
        session_id: model.session_id.clone(),
        checkout_url: model.checkout_url.clone(),
        status: model.status.clone(),
        amount: model.amount,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        paid_at: model.paid_at.map(|t| t.with_timezone(&chrono::Utc)),
        processed_by: model.processed_by.map(UserId::from_uuid),
    }
}

/// Fetches a report inside the transaction with a row lock.
async fn fetch_locked(
    txn: &DatabaseTransaction,
    report_id: Uuid,
) -> Result<expense_reports::Model, ReimbursementError> {
    expense_reports::Entity::find_by_id(report_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(ReimbursementError::ReportNotFound(report_id))
}

/// Applies a planned confirmation outcome atomically.
async fn apply_confirmation(
    txn: &DatabaseTransaction,
    report: expense_reports::Model,
    plan: ConfirmationOutcome,
    processed_by: Uuid,
    remarks: Option<String>,
) -> Result<(expense_reports::Model, ConfirmOutcome), ReimbursementError> {
    let report_id = report.id;

    match plan {
        ConfirmationOutcome::RecordStatusOnly { status } => {
            set_active_session_status(txn, report_id, &status, false).await?;
            Ok((report, ConfirmOutcome::StatusRecorded))
        }
        ConfirmationOutcome::AlreadySettled => {
            info!(report_id = %report_id, "Duplicate confirmation ignored");
            Ok((report, ConfirmOutcome::AlreadySettled))
        }
        ConfirmationOutcome::Reimburse { post_spend } => {
            if post_spend {
                post_report_spend(txn, report_id)
                    .await
                    .map_err(|e| ReimbursementError::Database(DbErr::Custom(e.to_string())))?;
            }

            let now = Utc::now().into();
            let mut active: expense_reports::ActiveModel = report.into();
            active.reimbursed = Set(true);
            if post_spend {
                active.spend_posted = Set(true);
            }
            active.updated_at = Set(now);
            let updated = active.update(txn).await?;

            set_active_session_status(txn, report_id, PaymentStatus::Paid.as_str(), true)
                .await?;

            let record = ApprovalRecord {
                report_id: ReportId::from_uuid(report_id),
                approver_id: UserId::from_uuid(processed_by),
                stage: ApprovalStage::Finance,
                decision: ApprovalDecision::Approved,
                remarks,
                decided_at: Utc::now(),
            };
            insert_approval(txn, &record)
                .await
                .map_err(|e| ReimbursementError::Database(DbErr::Custom(e.to_string())))?;

            info!(report_id = %report_id, "Report reimbursed");
            Ok((updated, ConfirmOutcome::Reimbursed))
        }
    }
}

/// Updates the report's active session status; stamps `paid_at` when the
/// session settles. A report without a session (manual path) is fine.
async fn set_active_session_status(
    txn: &DatabaseTransaction,
    report_id: Uuid,
    status: &str,
    stamp_paid_at: bool,
) -> Result<(), ReimbursementError> {
    let session = reimbursement_payments::Entity::find()
        .filter(reimbursement_payments::Column::ReportId.eq(report_id))
        .filter(reimbursement_payments::Column::Status.ne(PaymentStatus::Expired.as_str()))
        .one(txn)
        .await?;

    if let Some(session) = session {
        let now = Utc::now().into();
        let mut active: reimbursement_payments::ActiveModel = session.into();
        active.status = Set(status.to_string());
        if stamp_paid_at {
            active.paid_at = Set(Some(now));
        }
        active.updated_at = Set(now);
        active.update(txn).await?;
    }

    Ok(())
}
