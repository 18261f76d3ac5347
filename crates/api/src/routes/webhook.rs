//! Payment processor webhook endpoint.
//!
//! Mirrors the processor's delivery contract: the signature is verified
//! when a webhook secret is configured, unknown events and sessions are
//! ignored, and processing failures still answer 200 so the processor
//! does not retry storms against a poisoned payload.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::{error, info, warn};

use cems_db::repositories::ReimbursementRepository;
use cems_gateway::webhook::{paid_link_id, verify_signature};

use crate::AppState;

/// Creates the webhook routes (outside the versioned API).
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook/paymongo", post(handle_paymongo))
}

/// POST `/webhook/paymongo` - Apply a payment event.
async fn handle_paymongo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let secret = &state.config.paymongo.webhook_secret;
    if !secret.is_empty() {
        let signature = headers
            .get("paymongo-signature")
            .and_then(|v| v.to_str().ok());
        if !verify_signature(&body, signature, secret) {
            warn!("Webhook signature verification failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "status": "invalid_signature" })),
            )
                .into_response();
        }
    }

    let Some(link_id) = paid_link_id(&body) else {
        // Not a paid event; acknowledge and move on.
        return (StatusCode::OK, Json(json!({ "status": "received" }))).into_response();
    };

    let payments = ReimbursementRepository::new((*state.db).clone());
    match payments.confirm_by_session(&link_id, "paid").await {
        Ok(Some((report, outcome))) => {
            info!(report_id = %report.id, ?outcome, "Webhook confirmation applied");
            (StatusCode::OK, Json(json!({ "status": "received" }))).into_response()
        }
        Ok(None) => {
            warn!(link_id = %link_id, "Webhook for unknown payment session");
            (StatusCode::OK, Json(json!({ "status": "received" }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Webhook processing failed");
            (
                StatusCode::OK,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
                .into_response()
        }
    }
}
