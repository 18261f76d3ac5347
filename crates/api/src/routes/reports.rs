//! Expense report routes: submission, resubmission, and queries.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use cems_core::report::NewExpenseItem;
use cems_db::repositories::{ReportRepository, WorkflowRepository};

use crate::extractors::{Actor, Role};
use crate::routes::{
    ReportResponse, error_body, report_error_response, workflow_error_response,
};
use crate::AppState;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", post(submit_report))
        .route("/reports", get(list_my_reports))
        .route("/reports/{report_id}", get(get_report))
        .route("/reports/{report_id}", put(resubmit_report))
        .route("/reports/{report_id}/approvals", get(approval_trail))
        .route("/reports/{report_id}/exceedance", get(exceedance))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for submitting or resubmitting a report.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitReportRequest {
    /// Expense items; at least one is required.
    #[validate(length(min = 1, message = "at least one expense item is required"))]
    pub items: Vec<ItemInput>,
}

/// One expense item in a submission.
#[derive(Debug, Deserialize, Serialize)]
pub struct ItemInput {
    /// Budget category.
    pub category: String,
    /// Item amount.
    pub amount: Decimal,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Optional description.
    pub description: Option<String>,
    /// Optional receipt reference.
    pub receipt_ref: Option<String>,
}

impl ItemInput {
    fn into_core(self) -> NewExpenseItem {
        NewExpenseItem {
            category: self.category,
            amount: self.amount,
            expense_date: self.expense_date,
            description: self.description,
            receipt_ref: self.receipt_ref,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/reports` - Submit a new expense report.
async fn submit_report(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<SubmitReportRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Driver]) {
        return response;
    }
    if let Err(e) = payload.validate() {
        return error_body(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    let items: Vec<NewExpenseItem> = payload.items.into_iter().map(ItemInput::into_core).collect();

    let repo = ReportRepository::new((*state.db).clone());
    match repo
        .submit(actor.user_id, items, Utc::now().date_naive())
        .await
    {
        Ok(result) => (
            StatusCode::CREATED,
            Json(json!({
                "report": ReportResponse::from_core(&result.to_core())
            })),
        )
            .into_response(),
        Err(e) => report_error_response(e),
    }
}

/// PUT `/reports/{report_id}` - Resubmit an edited report.
///
/// Only legal while the report is not approved; resets the workflow to
/// `Submitted` and restarts the approval trail.
async fn resubmit_report(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<SubmitReportRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Driver]) {
        return response;
    }
    if let Err(e) = payload.validate() {
        return error_body(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
    }

    let repo = ReportRepository::new((*state.db).clone());

    // Drivers may only edit their own reports.
    match repo.find_with_items(report_id).await {
        Ok(existing) => {
            if actor.role == Role::Driver && existing.report.user_id != actor.user_id {
                return error_body(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "Reports can only be edited by their owner",
                );
            }
        }
        Err(e) => return report_error_response(e),
    }

    let items: Vec<NewExpenseItem> = payload.items.into_iter().map(ItemInput::into_core).collect();

    match repo
        .resubmit(report_id, items, Utc::now().date_naive())
        .await
    {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({
                "report": ReportResponse::from_core(&result.to_core())
            })),
        )
            .into_response(),
        Err(e) => report_error_response(e),
    }
}

/// GET `/reports` - List the actor's own reports, newest first.
async fn list_my_reports(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    let repo = ReportRepository::new((*state.db).clone());
    match repo.list_for_user(actor.user_id).await {
        Ok(reports) => {
            let response: Vec<ReportResponse> =
                reports.iter().map(ReportResponse::from_model).collect();
            (StatusCode::OK, Json(json!({ "reports": response }))).into_response()
        }
        Err(e) => report_error_response(e),
    }
}

/// GET `/reports/{report_id}` - Fetch a report with its items.
async fn get_report(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = ReportRepository::new((*state.db).clone());
    match repo.find_with_items(report_id).await {
        Ok(result) => {
            if actor.role == Role::Driver && result.report.user_id != actor.user_id {
                return error_body(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "Drivers can only view their own reports",
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "report": ReportResponse::from_core(&result.to_core())
                })),
            )
                .into_response()
        }
        Err(e) => report_error_response(e),
    }
}

/// GET `/reports/{report_id}/approvals` - The active approval trail.
async fn approval_trail(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
) -> impl IntoResponse {
    // Verify the report exists and the actor may see it.
    let reports = ReportRepository::new((*state.db).clone());
    match reports.find_with_items(report_id).await {
        Ok(result) => {
            if actor.role == Role::Driver && result.report.user_id != actor.user_id {
                return error_body(
                    StatusCode::FORBIDDEN,
                    "forbidden",
                    "Drivers can only view their own reports",
                );
            }
        }
        Err(e) => return report_error_response(e),
    }

    let workflow = WorkflowRepository::new((*state.db).clone());
    match workflow.approval_trail(report_id).await {
        Ok(trail) => {
            let response: Vec<serde_json::Value> = trail
                .iter()
                .map(|a| {
                    json!({
                        "id": a.id.to_string(),
                        "approver_id": a.approver_id.to_string(),
                        "stage": a.stage.to_core().as_str(),
                        "decision": a.decision.to_core().as_str(),
                        "remarks": a.remarks,
                        "decided_at": a.decided_at.to_rfc3339(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "approvals": response }))).into_response()
        }
        Err(e) => workflow_error_response(e),
    }
}

/// GET `/reports/{report_id}/exceedance` - Per-category budget
/// exceedance breakdown for the current month.
async fn exceedance(
    State(state): State<AppState>,
    actor: Actor,
    Path(report_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Manager, Role::Ceo, Role::Finance]) {
        return response;
    }

    let repo = ReportRepository::new((*state.db).clone());
    match repo.exceedance(report_id, Utc::now().date_naive()).await {
        Ok(rows) => {
            let response: Vec<serde_json::Value> = rows
                .iter()
                .map(|row| {
                    json!({
                        "category": row.category,
                        "allocated": row.allocated.map(|a| a.to_string()),
                        "month_spent": row.month_spent.to_string(),
                        "report_amount": row.report_amount.to_string(),
                        "projected_total": row.projected_total.to_string(),
                        "over_budget": row.over_budget,
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "categories": response }))).into_response()
        }
        Err(e) => report_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_submit_request_requires_items() {
        let payload = SubmitReportRequest { items: vec![] };
        assert!(payload.validate().is_err());

        let payload = SubmitReportRequest {
            items: vec![ItemInput {
                category: "Fuel".to_string(),
                amount: dec!(100),
                expense_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                description: None,
                receipt_ref: None,
            }],
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_item_input_maps_to_core() {
        let input = ItemInput {
            category: "Travel".to_string(),
            amount: dec!(42.50),
            expense_date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            description: Some("taxi".to_string()),
            receipt_ref: None,
        };
        let item = input.into_core();
        assert_eq!(item.category, "Travel");
        assert_eq!(item.amount, dec!(42.50));
        assert_eq!(item.description.as_deref(), Some("taxi"));
    }
}
