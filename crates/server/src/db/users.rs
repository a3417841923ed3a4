//! Enrolled member repository.
//!
//! Members are created or merged on every qualifying shipment event. The
//! upsert is a field-level merge, not a document replace: identity fields are
//! overwritten by the incoming payload, the `benefits` grant map is merged
//! additively (`||`), and `is_vip` only ever flips to true. A member may
//! accumulate multiple benefit grants over time from different purchases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use velvet_rope_core::{ApplicationId, CompanyId, MemberId, OrderId};

use super::RepositoryError;

/// A single benefit grant on a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenefitGrant {
    pub granted: bool,
    pub expires_at: DateTime<Utc>,
}

/// An enrolled member as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipUser {
    pub company_id: CompanyId,
    pub user_id: MemberId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub application_id: Option<ApplicationId>,
    pub order_id: Option<OrderId>,
    pub vip_days: i32,
    pub is_vip: bool,
    /// Map of benefit title to its grant.
    pub benefits: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload built by the shipment processor.
#[derive(Debug, Clone)]
pub struct VipUserUpsert {
    pub user_id: MemberId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub application_id: ApplicationId,
    pub order_id: Option<OrderId>,
    pub vip_days: i32,
    /// Benefit grants from this shipment, merged into the stored map.
    pub benefits: serde_json::Value,
}

/// Insert or merge a member record.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn upsert(
    pool: &PgPool,
    company_id: &CompanyId,
    user: &VipUserUpsert,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO vip_users
            (company_id, user_id, first_name, last_name, email, phone,
             application_id, order_id, vip_days, is_vip, benefits, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10, now())
        ON CONFLICT (company_id, user_id) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            application_id = EXCLUDED.application_id,
            order_id = EXCLUDED.order_id,
            vip_days = EXCLUDED.vip_days,
            is_vip = TRUE,
            benefits = vip_users.benefits || EXCLUDED.benefits,
            updated_at = now()
        ",
    )
    .bind(company_id.as_str())
    .bind(user.user_id.as_str())
    .bind(user.first_name.as_deref())
    .bind(user.last_name.as_deref())
    .bind(user.email.as_deref())
    .bind(user.phone.as_deref())
    .bind(user.application_id.as_str())
    .bind(user.order_id.as_ref().map(OrderId::as_str))
    .bind(user.vip_days)
    .bind(&user.benefits)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fetch a member by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(
    pool: &PgPool,
    company_id: &CompanyId,
    user_id: &MemberId,
) -> Result<Option<VipUser>, RepositoryError> {
    let row = sqlx::query(
        r"
        SELECT company_id, user_id, first_name, last_name, email, phone,
               application_id, order_id, vip_days, is_vip, benefits,
               created_at, updated_at
        FROM vip_users
        WHERE company_id = $1 AND user_id = $2
        ",
    )
    .bind(company_id.as_str())
    .bind(user_id.as_str())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let company_id: String = row.try_get("company_id")?;
    let user_id: String = row.try_get("user_id")?;
    let application_id: Option<String> = row.try_get("application_id")?;
    let order_id: Option<String> = row.try_get("order_id")?;

    Ok(Some(VipUser {
        company_id: CompanyId::new(company_id),
        user_id: MemberId::new(user_id),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        application_id: application_id.map(ApplicationId::new),
        order_id: order_id.map(OrderId::new),
        vip_days: row.try_get("vip_days")?,
        is_vip: row.try_get("is_vip")?,
        benefits: row.try_get("benefits")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    }))
}
