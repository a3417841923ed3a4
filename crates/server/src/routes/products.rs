//! Catalog and VIP product route handlers.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;

use crate::db::sessions;
use crate::db::vip_configs::{self, VipProduct};
use crate::error::AppError;
use crate::middleware::Company;
use crate::platform::ProductPage;
use crate::state::AppState;

/// Create the product routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/vip-products", get(get_vip_products).post(save_vip_products))
}

/// Pagination query for the catalog proxy.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page_no")]
    pub page_no: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

const fn default_page_no() -> u32 {
    1
}

const fn default_page_size() -> u32 {
    20
}

/// Proxy a page of the company's catalog products from the platform.
#[instrument(skip(state))]
async fn list_products(
    State(state): State<AppState>,
    Company(company_id): Company,
    Query(page): Query<PageQuery>,
) -> Result<Json<ProductPage>, AppError> {
    let session = sessions::latest_session(state.pool()).await?;

    let products = state
        .platform()
        .get_products(
            &session.access_token,
            &company_id,
            page.page_no,
            page.page_size.min(100),
        )
        .await?;

    Ok(Json(products))
}

/// Benefit catalog plus VIP product associations from the config store.
#[instrument(skip(state))]
async fn get_vip_products(
    State(state): State<AppState>,
    Company(company_id): Company,
) -> Result<Json<serde_json::Value>, AppError> {
    let config = state.vip_config(&company_id).await?;

    let body = match config {
        Some(config) => serde_json::json!({
            "benefits": &config.benefits,
            "vip_products": &config.vip_products,
        }),
        None => serde_json::json!({
            "benefits": [],
            "vip_products": [],
        }),
    };

    Ok(Json(body))
}

/// Request to save VIP product associations.
#[derive(Debug, Deserialize)]
pub struct SaveVipProductsRequest {
    pub vip_products: Vec<VipProduct>,
}

/// Save the company's benefit/product associations.
#[instrument(skip(state, request))]
async fn save_vip_products(
    State(state): State<AppState>,
    Company(company_id): Company,
    Json(request): Json<SaveVipProductsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if request.vip_products.is_empty() {
        return Err(AppError::BadRequest("no products selected".to_owned()));
    }

    vip_configs::set_vip_products(state.pool(), &company_id, &request.vip_products).await?;
    state.invalidate_vip_config(&company_id).await;

    Ok(Json(serde_json::json!({ "success": true })))
}
