//! Shipment webhook handler.
//!
//! Receives shipment lifecycle events from the platform and runs the
//! enrollment/attribution pipeline. Delivery is fire-and-forget from the
//! platform's perspective: once the body parses, the handler answers 200
//! regardless of how processing went - step outcomes land in the
//! `shipment_events` ledger instead.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info, instrument};

use crate::events::ShipmentWebhook;
use crate::services::ShipmentProcessor;
use crate::state::AppState;

/// Create the webhook routes router.
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/shipments", post(handle_shipment))
}

/// Handle a shipment lifecycle webhook.
#[instrument(skip(state, webhook), fields(event = %webhook.event, company = %webhook.company_id))]
async fn handle_shipment(
    State(state): State<AppState>,
    Json(webhook): Json<ShipmentWebhook>,
) -> StatusCode {
    // Config load failure degrades to "no config": attribution still runs.
    let config = match state.vip_config(&webhook.company_id).await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Could not load vip configuration for webhook");
            None
        }
    };

    let processor = ShipmentProcessor::new(state.pool().clone(), state.platform().clone());
    let summary = processor
        .process(
            &webhook.event,
            &webhook.company_id,
            &webhook.application_id,
            &webhook.payload,
            config.as_deref(),
        )
        .await;

    info!(
        enrolled = summary.enrolled,
        attributed = summary.attributed,
        steps = summary.steps.len(),
        "Shipment event processed"
    );

    StatusCode::OK
}
