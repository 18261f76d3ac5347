//! Reimbursement routes: checkout initiation, status refresh, and the
//! manual settlement escape hatch.
//!
//! The gateway is called before any local mutation; on gateway failure
//! the operation aborts with local state unchanged, and the caller may
//! retry or confirm explicitly later.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use cems_core::reimbursement::Reconciler;
use cems_db::repositories::{ReimbursementRepository, ReportRepository};
use cems_gateway::CheckoutRequest;
use cems_shared::AppError;
use cems_shared::types::ReportId;

use crate::extractors::{Actor, Role};
use crate::routes::{
    ReportResponse, app_error_response, gateway_error_response, reimbursement_error_response,
    report_error_response,
};
use crate::AppState;

/// Creates the reimbursement routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/{report_id}/reimbursement", post(initiate))
        .route("/reports/{report_id}/reimbursement", get(active_session))
        .route("/reports/{report_id}/reimbursement/refresh", post(refresh))
        .route(
            "/reports/{report_id}/reimbursement/manual",
            post(mark_manual),
        )
}

/// Optional payee details forwarded to the processor at initiation.
#[derive(Debug, Default, Deserialize)]
pub struct InitiateRequest {
    /// Payee email.
    pub customer_email: Option<String>,
    /// Payee display name.
    pub customer_name: Option<String>,
}

/// POST `/reports/{report_id}/reimbursement` - Create (or replace) the
/// report's checkout session.
async fn initiate(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
    payload: Option<Json<InitiateRequest>>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Finance]) {
        return response;
    }
    let Json(payload) = payload.unwrap_or_default();

    let reports = ReportRepository::new((*state.db).clone());
    let report = match reports.find_with_items(report_id).await {
        Ok(result) => result.report,
        Err(e) => return report_error_response(e),
    };

    // Over-budget reports must clear CEO approval before finance acts.
    if let Err(e) = Reconciler::ensure_eligible(
        report.status.to_core(),
        report.reimbursed,
        report.budget_check.to_core(),
        report.ceo_approved,
    ) {
        return app_error_response(&AppError::InvalidState(e.to_string()));
    }

    let payments = ReimbursementRepository::new((*state.db).clone());
    let active = match payments.active_session(report_id).await {
        Ok(active) => active,
        Err(e) => return reimbursement_error_response(e),
    };

    // Session snapshot check happens before the gateway call; the
    // record step re-checks inside its transaction.
    if let Err(e) = Reconciler::check_initiate(active.as_ref()) {
        return app_error_response(&AppError::AlreadyPaid(e.to_string()));
    }

    let request = CheckoutRequest {
        amount: report.total_amount,
        description: format!("Expense reimbursement for report {report_id}"),
        report_id: ReportId::from_uuid(report_id),
        success_url: state.config.paymongo.success_url.clone(),
        cancel_url: state.config.paymongo.cancel_url.clone(),
        customer_email: payload.customer_email,
        customer_name: payload.customer_name,
    };

    let session = match state.gateway.create_checkout_session(request).await {
        Ok(session) => session,
        Err(e) => return gateway_error_response(e),
    };

    match payments
        .record_session(
            report_id,
            session.session_id,
            session.checkout_url,
            report.total_amount,
            actor.user_id,
        )
        .await
    {
        Ok(stored) => {
            info!(report_id = %report_id, session_id = %stored.session_id, "Checkout session created");
            (
                StatusCode::CREATED,
                Json(json!({
                    "payment": {
                        "session_id": stored.session_id,
                        "checkout_url": stored.checkout_url,
                        "status": stored.status,
                        "amount": stored.amount.to_string(),
                    }
                })),
            )
                .into_response()
        }
        Err(e) => reimbursement_error_response(e),
    }
}

/// GET `/reports/{report_id}/reimbursement` - The report's active
/// payment session.
async fn active_session(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Finance, Role::Driver]) {
        return response;
    }

    let payments = ReimbursementRepository::new((*state.db).clone());
    match payments.active_session(report_id).await {
        Ok(Some(session)) => (
            StatusCode::OK,
            Json(json!({
                "payment": {
                    "session_id": session.session_id,
                    "checkout_url": session.checkout_url,
                    "status": session.status,
                    "amount": session.amount.to_string(),
                    "paid_at": session.paid_at.map(|t| t.to_rfc3339()),
                }
            })),
        )
            .into_response(),
        Ok(None) => app_error_response(&AppError::NotFound(
            "No active payment session for this report".to_string(),
        )),
        Err(e) => reimbursement_error_response(e),
    }
}

/// POST `/reports/{report_id}/reimbursement/refresh` - Poll the gateway
/// for the session's status and apply the confirmation.
async fn refresh(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Finance]) {
        return response;
    }

    let payments = ReimbursementRepository::new((*state.db).clone());
    let session = match payments.active_session(report_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return app_error_response(&AppError::NotFound(
                "No active payment session for this report".to_string(),
            ));
        }
        Err(e) => return reimbursement_error_response(e),
    };

    // Query first; local state only moves on a parsed response.
    let external_status = match state.gateway.get_checkout_status(&session.session_id).await {
        Ok(status) => status,
        Err(e) => return gateway_error_response(e),
    };

    match payments
        .confirm_payment(report_id, &external_status, actor.user_id)
        .await
    {
        Ok((report, outcome)) => (
            StatusCode::OK,
            Json(json!({
                "report": ReportResponse::from_model(&report),
                "external_status": external_status,
                "outcome": format!("{outcome:?}"),
            })),
        )
            .into_response(),
        Err(e) => reimbursement_error_response(e),
    }
}

/// POST `/reports/{report_id}/reimbursement/manual` - Mark a report
/// reimbursed without consulting the processor.
async fn mark_manual(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Finance]) {
        return response;
    }

    let reports = ReportRepository::new((*state.db).clone());
    let report = match reports.find_with_items(report_id).await {
        Ok(result) => result.report,
        Err(e) => return report_error_response(e),
    };

    if let Err(e) = Reconciler::ensure_eligible(
        report.status.to_core(),
        report.reimbursed,
        report.budget_check.to_core(),
        report.ceo_approved,
    ) {
        // A second manual call on a reimbursed report is a no-op, not an
        // error; only genuinely ineligible reports are refused.
        if !report.reimbursed {
            return app_error_response(&AppError::InvalidState(e.to_string()));
        }
    }

    let payments = ReimbursementRepository::new((*state.db).clone());
    match payments
        .mark_reimbursed_manual(report_id, actor.user_id)
        .await
    {
        Ok((report, outcome)) => (
            StatusCode::OK,
            Json(json!({
                "report": ReportResponse::from_model(&report),
                "outcome": format!("{outcome:?}"),
            })),
        )
            .into_response(),
        Err(e) => reimbursement_error_response(e),
    }
}
