//! Approval workflow routes: manager and CEO decisions plus the
//! per-role pending queues.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use cems_core::workflow::BudgetReallocation;
use cems_db::repositories::WorkflowRepository;

use crate::extractors::{Actor, Role};
use crate::routes::{ReportResponse, error_body, workflow_error_response};
use crate::AppState;

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reports/{report_id}/manager-approval",
            post(manager_decision),
        )
        .route("/reports/{report_id}/forward-to-ceo", post(forward_to_ceo))
        .route("/reports/{report_id}/ceo-approval", post(ceo_decision))
        .route("/pending", get(pending_for_role))
}

// ============================================================================
// Request Types
// ============================================================================

/// A manager decision.
#[derive(Debug, Deserialize)]
pub struct ManagerDecisionRequest {
    /// `approve` or `reject`.
    pub decision: String,
    /// Remarks; required for rejections.
    pub remarks: Option<String>,
}

/// A CEO decision, optionally with inline budget reallocations.
#[derive(Debug, Deserialize)]
pub struct CeoDecisionRequest {
    /// `approve` or `reject`.
    pub decision: String,
    /// Remarks; required for rejections.
    pub remarks: Option<String>,
    /// Allocation changes applied atomically with an approval.
    #[serde(default)]
    pub reallocations: Vec<ReallocationInput>,
}

/// One inline allocation change.
#[derive(Debug, Deserialize)]
pub struct ReallocationInput {
    /// Category to reallocate.
    pub category: String,
    /// New allocated amount.
    pub allocated: Decimal,
}

/// Query parameters for the pending queue.
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    /// Which queue to read: `manager`, `ceo`, or `finance`.
    pub role: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/reports/{report_id}/manager-approval` - Manager approves or
/// rejects a submitted report.
async fn manager_decision(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<ManagerDecisionRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Manager]) {
        return response;
    }

    let repo = WorkflowRepository::new((*state.db).clone());
    let result = match payload.decision.to_lowercase().as_str() {
        "approve" => {
            repo.approve_as_manager(report_id, actor.user_id, payload.remarks)
                .await
        }
        "reject" => {
            repo.reject_as_manager(
                report_id,
                actor.user_id,
                payload.remarks.unwrap_or_default(),
            )
            .await
        }
        other => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "invalid_decision",
                format!("Unknown decision '{other}'; expected 'approve' or 'reject'"),
            );
        }
    };

    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "report": ReportResponse::from_model(&report) })),
        )
            .into_response(),
        Err(e) => workflow_error_response(e),
    }
}

/// POST `/reports/{report_id}/forward-to-ceo` - Manager escalates a
/// submitted report without deciding.
async fn forward_to_ceo(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<ManagerDecisionRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Manager]) {
        return response;
    }

    let repo = WorkflowRepository::new((*state.db).clone());
    match repo
        .forward_to_ceo(report_id, actor.user_id, payload.remarks)
        .await
    {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "report": ReportResponse::from_model(&report) })),
        )
            .into_response(),
        Err(e) => workflow_error_response(e),
    }
}

/// POST `/reports/{report_id}/ceo-approval` - CEO approves or rejects
/// an escalated report, optionally reallocating budgets inline.
async fn ceo_decision(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<CeoDecisionRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Ceo]) {
        return response;
    }

    let repo = WorkflowRepository::new((*state.db).clone());
    let result = match payload.decision.to_lowercase().as_str() {
        "approve" => {
            let reallocations = payload
                .reallocations
                .into_iter()
                .map(|r| BudgetReallocation {
                    category: r.category,
                    allocated: r.allocated,
                })
                .collect();
            repo.approve_as_ceo(report_id, actor.user_id, payload.remarks, reallocations)
                .await
        }
        "reject" => {
            repo.reject_as_ceo(
                report_id,
                actor.user_id,
                payload.remarks.unwrap_or_default(),
            )
            .await
        }
        other => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "invalid_decision",
                format!("Unknown decision '{other}'; expected 'approve' or 'reject'"),
            );
        }
    };

    match result {
        Ok(report) => (
            StatusCode::OK,
            Json(json!({ "report": ReportResponse::from_model(&report) })),
        )
            .into_response(),
        Err(e) => workflow_error_response(e),
    }
}

/// GET `/pending?role=` - The pending queue for a role.
///
/// Managers see submitted reports, the CEO sees escalations, and
/// finance sees the reimbursement queue (approved, unreimbursed, and
/// within budget or CEO-approved).
async fn pending_for_role(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<PendingQuery>,
) -> impl IntoResponse {
    let Some(queue_role) = Role::parse(&query.role) else {
        return error_body(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            format!("Unknown role '{}'", query.role),
        );
    };

    if let Err(response) = actor.require(&[queue_role]) {
        return response;
    }

    let repo = WorkflowRepository::new((*state.db).clone());
    let result = match queue_role {
        Role::Manager => repo.pending_for_manager().await,
        Role::Ceo => repo.pending_for_ceo().await,
        Role::Finance => repo.reimbursement_queue().await,
        Role::Driver | Role::Admin => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "invalid_role",
                "Pending queues exist for manager, ceo, and finance",
            );
        }
    };

    match result {
        Ok(reports) => {
            let response: Vec<ReportResponse> =
                reports.iter().map(ReportResponse::from_model).collect();
            (StatusCode::OK, Json(json!({ "reports": response }))).into_response()
        }
        Err(e) => workflow_error_response(e),
    }
}
