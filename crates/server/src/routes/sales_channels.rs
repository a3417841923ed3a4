//! Sales channel route handlers.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use velvet_rope_core::ApplicationId;

use crate::db::sessions;
use crate::error::AppError;
use crate::middleware::Company;
use crate::platform::Application;
use crate::services::PlanService;
use crate::services::plans::{PlanOutcome, PlanRequest};
use crate::state::AppState;

/// Create the sales channel routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales-channels", get(list_sales_channels))
        .route("/api/applications/{id}", get(get_application))
        .route("/api/sales-channels/configure-plans", post(configure_plans))
}

/// A sales channel with its configured flag.
#[derive(Debug, Serialize)]
pub struct SalesChannel {
    #[serde(flatten)]
    pub application: Application,
    pub is_configured: bool,
}

/// List the company's sales channels, marking the ones already configured
/// for the VIP program.
#[instrument(skip(state))]
async fn list_sales_channels(
    State(state): State<AppState>,
    Company(company_id): Company,
) -> Result<Json<Vec<SalesChannel>>, AppError> {
    let session = sessions::latest_session(state.pool()).await?;

    let page = state
        .platform()
        .get_applications(&session.access_token, &company_id)
        .await?;

    let config = state.vip_config(&company_id).await?;
    let configured: Vec<ApplicationId> = config
        .map(|c| c.application_ids.clone())
        .unwrap_or_default();

    let channels = page
        .items
        .into_iter()
        .map(|application| {
            let is_configured = configured
                .iter()
                .any(|id| id.as_str() == application.id);
            SalesChannel {
                application,
                is_configured,
            }
        })
        .collect();

    Ok(Json(channels))
}

/// Proxy one application's detail from the platform.
#[instrument(skip(state))]
async fn get_application(
    State(state): State<AppState>,
    Company(company_id): Company,
    Path(id): Path<String>,
) -> Result<Json<Application>, AppError> {
    let session = sessions::latest_session(state.pool()).await?;

    let application = state
        .platform()
        .get_application(&session.access_token, &company_id, &ApplicationId::new(id))
        .await?;

    Ok(Json(application))
}

/// Request to provision plans on a set of applications.
#[derive(Debug, Deserialize)]
pub struct ConfigurePlansRequest {
    pub application_ids: Vec<ApplicationId>,
    pub plans: Vec<PlanRequest>,
}

/// Provision attributes and user groups for the enabled plans.
#[instrument(skip(state, request), fields(apps = request.application_ids.len()))]
async fn configure_plans(
    State(state): State<AppState>,
    Company(company_id): Company,
    Json(request): Json<ConfigurePlansRequest>,
) -> Result<Json<PlanOutcome>, AppError> {
    let service = PlanService::new(state.pool().clone(), state.platform().clone());

    let outcome = service
        .configure_plans(&company_id, &request.application_ids, &request.plans)
        .await?;

    state.invalidate_vip_config(&company_id).await;

    Ok(Json(outcome))
}
