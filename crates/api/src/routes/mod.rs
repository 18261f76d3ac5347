//! API route definitions.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use cems_core::report::ExpenseReport;
use cems_core::workflow::WorkflowError;
use cems_db::entities::expense_reports;
use cems_db::repositories::{ReimbursementError, ReportError};
use cems_gateway::GatewayError;
use cems_shared::AppError;

use crate::AppState;

pub mod approvals;
pub mod budgets;
pub mod health;
pub mod reimbursements;
pub mod reports;
pub mod webhook;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(reports::routes())
        .merge(approvals::routes())
        .merge(reimbursements::routes())
        .merge(budgets::routes())
}

// ============================================================================
// Response Types
// ============================================================================

/// Report snapshot returned by every mutating operation.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// Report ID.
    pub id: String,
    /// Owning user ID.
    pub user_id: String,
    /// Submission timestamp (RFC 3339).
    pub submission_date: String,
    /// Workflow status.
    pub status: &'static str,
    /// Budget check verdict.
    pub budget_check: &'static str,
    /// Report total.
    pub total_amount: String,
    /// Escalation flag.
    pub forwarded_to_ceo: bool,
    /// CEO approval flag.
    pub ceo_approved: bool,
    /// Reimbursement flag.
    pub reimbursed: bool,
    /// Items, when the operation loaded them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemResponse>>,
}

/// Expense item representation.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    /// Item ID.
    pub id: String,
    /// Budget category.
    pub category: String,
    /// Item amount.
    pub amount: String,
    /// Date the expense was incurred.
    pub expense_date: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional receipt reference.
    pub receipt_ref: Option<String>,
}

impl ReportResponse {
    /// Builds a snapshot without items.
    pub(crate) fn from_model(report: &expense_reports::Model) -> Self {
        Self {
            id: report.id.to_string(),
            user_id: report.user_id.to_string(),
            submission_date: report.submission_date.to_rfc3339(),
            status: report.status.to_core().as_str(),
            budget_check: report.budget_check.to_core().as_str(),
            total_amount: report.total_amount.to_string(),
            forwarded_to_ceo: report.forwarded_to_ceo,
            ceo_approved: report.ceo_approved,
            reimbursed: report.reimbursed,
            items: None,
        }
    }

    /// Builds a snapshot including items from the core report.
    pub(crate) fn from_core(report: &ExpenseReport) -> Self {
        Self {
            id: report.id.to_string(),
            user_id: report.user_id.to_string(),
            submission_date: report.submission_date.to_rfc3339(),
            status: report.status.as_str(),
            budget_check: report.budget_check.as_str(),
            total_amount: report.total_amount.to_string(),
            forwarded_to_ceo: report.forwarded_to_ceo,
            ceo_approved: report.ceo_approved,
            reimbursed: report.reimbursed,
            items: Some(
                report
                    .items
                    .iter()
                    .map(|item| ItemResponse {
                        id: item.id.to_string(),
                        category: item.category.clone(),
                        amount: item.amount.to_string(),
                        expense_date: item.expense_date.to_string(),
                        description: item.description.clone(),
                        receipt_ref: item.receipt_ref.clone(),
                    })
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Builds a JSON error response.
pub(crate) fn error_body(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into()
        })),
    )
        .into_response()
}

/// Renders an application error with its declared status and code.
///
/// Database and internal failures answer with an opaque 500; details go
/// to the log only. `retryable` tells clients whether repeating the
/// call may succeed.
pub(crate) fn app_error_response(e: &AppError) -> Response {
    if matches!(e, AppError::Database(_) | AppError::Internal(_)) {
        error!(error = %e, "Internal error");
        return error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "An error occurred",
        );
    }

    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code().to_lowercase(),
            "message": e.to_string(),
            "retryable": e.is_retryable(),
        })),
    )
        .into_response()
}

/// Maps report repository errors onto HTTP responses.
pub(crate) fn report_error_response(e: ReportError) -> Response {
    app_error_response(&e.into())
}

/// Maps workflow errors onto HTTP responses using their declared codes.
pub(crate) fn workflow_error_response(e: WorkflowError) -> Response {
    if matches!(e, WorkflowError::Database(_)) {
        return app_error_response(&AppError::Database(e.to_string()));
    }
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let code = e.error_code().to_lowercase();
    error_body(status, &code, e.to_string())
}

/// Maps reimbursement repository errors onto HTTP responses.
pub(crate) fn reimbursement_error_response(e: ReimbursementError) -> Response {
    app_error_response(&e.into())
}

/// Maps gateway errors onto HTTP responses.
///
/// Gateway failures abort the operation with no local mutation; callers
/// may retry and confirm explicitly afterwards.
pub(crate) fn gateway_error_response(e: GatewayError) -> Response {
    match e {
        GatewayError::AmountBelowMinimum(_) => {
            app_error_response(&AppError::Validation(e.to_string()))
        }
        GatewayError::NotConfigured => error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "gateway_not_configured",
            e.to_string(),
        ),
        GatewayError::Http(_)
        | GatewayError::UnexpectedStatus { .. }
        | GatewayError::InvalidResponse(_) => {
            error!(error = %e, "Payment gateway failure");
            app_error_response(&AppError::ExternalService(
                "Payment gateway call failed; the operation was not applied".to_string(),
            ))
        }
    }
}
