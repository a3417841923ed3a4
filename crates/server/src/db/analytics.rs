//! Promotion attribution analytics.
//!
//! One row per promo-matched order, append-only. The unique
//! `(company_id, order_id, campaign_id)` key makes webhook redelivery a
//! no-op instead of a duplicate attribution.

use serde::Serialize;
use sqlx::PgPool;

use velvet_rope_core::{ApplicationId, CampaignId, CompanyId, OrderId, PromotionId};

use super::RepositoryError;

/// An attribution record for a promo-matched order.
#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    pub company_id: CompanyId,
    pub application_id: ApplicationId,
    pub order_id: OrderId,
    pub campaign_id: CampaignId,
    pub promotion_id: PromotionId,
    pub promotion_type: String,
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Insert an attribution row.
///
/// Returns `true` if a row was inserted, `false` if the order was already
/// attributed to this campaign (redelivered webhook).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn insert(pool: &PgPool, record: &Attribution) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        INSERT INTO analytics
            (company_id, application_id, order_id, campaign_id, promotion_id,
             promotion_type, user_id, first_name, last_name, email, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT ON CONSTRAINT analytics_order_campaign_key DO NOTHING
        ",
    )
    .bind(record.company_id.as_str())
    .bind(record.application_id.as_str())
    .bind(record.order_id.as_str())
    .bind(record.campaign_id.as_i32())
    .bind(record.promotion_id.as_str())
    .bind(&record.promotion_type)
    .bind(record.user_id.as_deref())
    .bind(record.first_name.as_deref())
    .bind(record.last_name.as_deref())
    .bind(record.email.as_deref())
    .bind(record.phone.as_deref())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
