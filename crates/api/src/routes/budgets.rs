//! Budget ledger routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use cems_db::repositories::BudgetRepository;

use crate::extractors::{Actor, Role};
use crate::routes::app_error_response;
use crate::AppState;

/// Creates the budget routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets))
        .route("/budgets/{category}", put(upsert_allocation))
}

/// Request body for setting a category allocation.
#[derive(Debug, Deserialize)]
pub struct UpsertAllocationRequest {
    /// The new allocated amount.
    pub allocated: Decimal,
}

/// GET `/budgets` - List budget rows with allocation and running spend.
async fn list_budgets(State(state): State<AppState>, actor: Actor) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Manager, Role::Ceo, Role::Finance]) {
        return response;
    }

    let repo = BudgetRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(rows) => {
            let response: Vec<serde_json::Value> = rows
                .iter()
                .map(|b| {
                    json!({
                        "category": b.category,
                        "allocated": b.allocated.to_string(),
                        "spent": b.spent.to_string(),
                        "remaining": b.remaining().to_string(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "budgets": response }))).into_response()
        }
        Err(e) => app_error_response(&e.into()),
    }
}

/// PUT `/budgets/{category}` - Create or update a category allocation.
async fn upsert_allocation(
    State(state): State<AppState>,
    actor: Actor,
    Path(category): Path<String>,
    Json(payload): Json<UpsertAllocationRequest>,
) -> impl IntoResponse {
    if let Err(response) = actor.require(&[Role::Ceo]) {
        return response;
    }

    let repo = BudgetRepository::new((*state.db).clone());
    match repo.upsert_allocation(&category, payload.allocated).await {
        Ok(row) => (
            StatusCode::OK,
            Json(json!({
                "budget": {
                    "category": row.category,
                    "allocated": row.allocated.to_string(),
                    "spent": row.spent.to_string(),
                }
            })),
        )
            .into_response(),
        Err(e) => app_error_response(&e.into()),
    }
}
