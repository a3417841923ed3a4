//! Campaign route handlers.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::instrument;

use velvet_rope_core::CampaignId;

use crate::db::campaigns::{self, Campaign};
use crate::error::AppError;
use crate::middleware::Company;
use crate::services::CampaignService;
use crate::services::campaigns::{CampaignOutcome, CreateCampaignRequest};
use crate::state::AppState;

/// Create the campaign routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/promotions/campaigns",
            get(list_campaigns).post(create_campaign),
        )
        .route("/api/promotions/campaigns/{id}", get(get_campaign))
}

/// Create a campaign and its per-application promotions.
#[instrument(skip(state, request), fields(campaign = %request.name))]
async fn create_campaign(
    State(state): State<AppState>,
    Company(company_id): Company,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<Json<CampaignOutcome>, AppError> {
    let service = CampaignService::new(state.pool().clone(), state.platform().clone());
    let outcome = service.create_campaign(&company_id, request).await?;
    Ok(Json(outcome))
}

/// List the company's campaigns, newest first.
#[instrument(skip(state))]
async fn list_campaigns(
    State(state): State<AppState>,
    Company(company_id): Company,
) -> Result<Json<Vec<Campaign>>, AppError> {
    let campaigns = campaigns::list_for_company(state.pool(), &company_id).await?;
    Ok(Json(campaigns))
}

/// Fetch one campaign by its 6-digit ID.
#[instrument(skip(state))]
async fn get_campaign(
    State(state): State<AppState>,
    Company(company_id): Company,
    Path(id): Path<i32>,
) -> Result<Json<Campaign>, AppError> {
    campaigns::get_by_campaign_id(state.pool(), &company_id, CampaignId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("campaign {id}")))
}
