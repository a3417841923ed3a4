//! Seed command for local development.
//!
//! Inserts a demo benefit catalog for a company so the dashboard and webhook
//! paths have something to work against, plus a throwaway platform session
//! row for local testing against a platform stub.

use sqlx::PgPool;

use super::{CommandError, database_url};

/// Seed a demo VIP configuration for `company_id`.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn run(company_id: &str) -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    seed_config(&pool, company_id).await?;
    seed_session(&pool).await?;

    tracing::info!(company = %company_id, "Seed complete!");
    Ok(())
}

async fn seed_config(pool: &PgPool, company_id: &str) -> Result<(), CommandError> {
    let benefits = serde_json::json!([
        {
            "title": "CUSTOM_PROMOTIONS",
            "is_enabled": true,
            "description": "Member-only promotions on selected products"
        },
        {
            "title": "PRODUCT_EXCLUSIVITY",
            "is_enabled": true,
            "description": "Early and exclusive access to selected products"
        }
    ]);

    sqlx::query(
        r"
        INSERT INTO vip_configs (company_id, benefits, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (company_id) DO UPDATE SET
            benefits = EXCLUDED.benefits,
            updated_at = now()
        ",
    )
    .bind(company_id)
    .bind(benefits)
    .execute(pool)
    .await?;

    tracing::info!("Seeded benefit catalog");
    Ok(())
}

async fn seed_session(pool: &PgPool) -> Result<(), CommandError> {
    let session = serde_json::json!({
        "access_token": "local-dev-token",
        "expires_in": 86_400
    });

    sqlx::query(
        r"
        INSERT INTO platform_sessions (key, value, ttl)
        VALUES ('seed', $1, $2)
        ON CONFLICT (key) DO UPDATE SET
            value = EXCLUDED.value,
            ttl = EXCLUDED.ttl
        ",
    )
    .bind(session)
    .bind(chrono::Utc::now().timestamp() + 86_400)
    .execute(pool)
    .await?;

    tracing::info!("Seeded platform session");
    Ok(())
}
