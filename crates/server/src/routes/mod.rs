//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness check
//! GET  /health/ready                         - Readiness check (verifies DB)
//!
//! # Catalog (platform proxy)
//! GET  /api/products                         - Paged catalog products
//!
//! # VIP products
//! GET  /api/vip-products                     - Benefit catalog + associations
//! POST /api/vip-products                     - Save benefit/product associations
//!
//! # Sales channels
//! GET  /api/sales-channels                   - Applications with configured flag
//! GET  /api/applications/{id}                - Application detail (platform proxy)
//! POST /api/sales-channels/configure-plans   - Provision attributes + groups
//!
//! # Campaigns
//! POST /api/promotions/campaigns             - Create campaign + promotions
//! GET  /api/promotions/campaigns             - List campaigns
//! GET  /api/promotions/campaigns/{id}        - Campaign detail
//!
//! # Webhooks
//! POST /webhooks/shipments                   - Shipment lifecycle events
//! ```
//!
//! Admin routes resolve the acting company from the `X-Company-Id` header
//! stamped by the platform's extension proxy; the webhook body carries its
//! own company/application identifiers.

pub mod products;
pub mod promotions;
pub mod sales_channels;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Create the application router (health endpoints are mounted in `main`).
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(sales_channels::router())
        .merge(promotions::router())
        .merge(webhooks::router())
}
