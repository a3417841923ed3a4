//! Campaign repository.
//!
//! Campaigns are created once by the provisioner and are read-only
//! afterwards, except for attribution matching on the webhook path.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use velvet_rope_core::{ApplicationId, CampaignId, CompanyId, DiscountKind, ItemUid, PromotionId};

use super::RepositoryError;

/// A campaign's discount, value carried as a string (e.g. `"20"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: String,
}

/// A promotional campaign document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub campaign_id: CampaignId,
    pub company_id: CompanyId,
    pub name: String,
    /// Benefit type this campaign targets (its user group name).
    pub benefit_type: String,
    pub application_ids: Vec<ApplicationId>,
    /// Remote promotion created per application, keyed by application ID.
    pub promotions: BTreeMap<String, PromotionId>,
    pub products: Vec<ItemUid>,
    pub discount: Option<Discount>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub pre_launch_days: i32,
    pub offer_text: Option<String>,
    pub offer_label: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether the campaign window `[start_date, end_date)` contains `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now < self.end_date
    }

    /// The remote promotion recorded for an application, if any.
    #[must_use]
    pub fn promotion_for(&self, application_id: &ApplicationId) -> Option<&PromotionId> {
        self.promotions.get(application_id.as_str())
    }
}

/// Insert a campaign document.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the 6-digit `campaign_id` is
/// already taken (callers regenerate and retry), `RepositoryError::Database`
/// for other failures.
pub async fn insert(pool: &PgPool, campaign: &Campaign) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO campaigns
            (campaign_id, company_id, name, benefit_type, application_ids,
             promotions, products, discount, start_date, end_date,
             pre_launch_days, offer_text, offer_label, description, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ",
    )
    .bind(campaign.campaign_id.as_i32())
    .bind(campaign.company_id.as_str())
    .bind(&campaign.name)
    .bind(&campaign.benefit_type)
    .bind(encode("application_ids", &campaign.application_ids)?)
    .bind(encode("promotions", &campaign.promotions)?)
    .bind(encode("products", &campaign.products)?)
    .bind(
        campaign
            .discount
            .as_ref()
            .map(|d| encode("discount", d))
            .transpose()?,
    )
    .bind(campaign.start_date)
    .bind(campaign.end_date)
    .bind(campaign.pre_launch_days)
    .bind(campaign.offer_text.as_deref())
    .bind(campaign.offer_label.as_deref())
    .bind(campaign.description.as_deref())
    .bind(campaign.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict(format!(
                "campaign id {} already exists",
                campaign.campaign_id
            ));
        }
        RepositoryError::Database(e)
    })?;

    Ok(())
}

/// List a company's campaigns, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_company(
    pool: &PgPool,
    company_id: &CompanyId,
) -> Result<Vec<Campaign>, RepositoryError> {
    let rows = sqlx::query(&select_sql("WHERE company_id = $1 ORDER BY created_at DESC"))
        .bind(company_id.as_str())
        .fetch_all(pool)
        .await?;

    rows.iter().map(decode_row).collect()
}

/// Fetch one campaign by its 6-digit ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_by_campaign_id(
    pool: &PgPool,
    company_id: &CompanyId,
    campaign_id: CampaignId,
) -> Result<Option<Campaign>, RepositoryError> {
    let row = sqlx::query(&select_sql("WHERE company_id = $1 AND campaign_id = $2"))
        .bind(company_id.as_str())
        .bind(campaign_id.as_i32())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(decode_row).transpose()
}

/// Campaigns whose active window `[start_date, end_date)` contains `now`.
///
/// Application membership is checked by the caller; the window is the only
/// filter pushed into SQL.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn active_for_company(
    pool: &PgPool,
    company_id: &CompanyId,
    now: DateTime<Utc>,
) -> Result<Vec<Campaign>, RepositoryError> {
    let rows = sqlx::query(&select_sql(
        "WHERE company_id = $1 AND start_date <= $2 AND end_date > $2",
    ))
    .bind(company_id.as_str())
    .bind(now)
    .fetch_all(pool)
    .await?;

    rows.iter().map(decode_row).collect()
}

fn select_sql(clause: &str) -> String {
    format!(
        "SELECT campaign_id, company_id, name, benefit_type, application_ids, \
         promotions, products, discount, start_date, end_date, pre_launch_days, \
         offer_text, offer_label, description, created_at \
         FROM campaigns {clause}"
    )
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Campaign, RepositoryError> {
    let company_id: String = row.try_get("company_id")?;
    let discount: Option<serde_json::Value> = row.try_get("discount")?;

    Ok(Campaign {
        campaign_id: CampaignId::new(row.try_get("campaign_id")?),
        company_id: CompanyId::new(company_id),
        name: row.try_get("name")?,
        benefit_type: row.try_get("benefit_type")?,
        application_ids: decode(row, "application_ids")?,
        promotions: decode(row, "promotions")?,
        products: decode(row, "products")?,
        discount: discount
            .map(|v| {
                serde_json::from_value(v).map_err(|e| RepositoryError::corrupt("discount", &e))
            })
            .transpose()?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        pre_launch_days: row.try_get("pre_launch_days")?,
        offer_text: row.try_get("offer_text")?,
        offer_label: row.try_get("offer_label")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn decode<T: serde::de::DeserializeOwned>(
    row: &sqlx::postgres::PgRow,
    column: &str,
) -> Result<T, RepositoryError> {
    let value: serde_json::Value = row.try_get(column)?;
    serde_json::from_value(value).map_err(|e| RepositoryError::corrupt(column, &e))
}

fn encode<T: Serialize>(context: &str, value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::corrupt(context, &e))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn campaign(start: &str, end: &str) -> Campaign {
        Campaign {
            campaign_id: CampaignId::new(123_456),
            company_id: CompanyId::new("42"),
            name: "Summer VIP".to_owned(),
            benefit_type: "CUSTOM_PROMOTIONS".to_owned(),
            application_ids: vec![ApplicationId::new("A1")],
            promotions: BTreeMap::from([(
                "A1".to_owned(),
                PromotionId::new("promo-1"),
            )]),
            products: vec![ItemUid::new(100)],
            discount: None,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            pre_launch_days: 0,
            offer_text: None,
            offer_label: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_window_is_half_open() {
        let c = campaign("2024-06-01T00:00:00Z", "2024-06-30T00:00:00Z");

        assert!(c.is_active("2024-06-15T12:00:00Z".parse().unwrap()));
        assert!(c.is_active("2024-06-01T00:00:00Z".parse().unwrap()));
        // end_date itself is outside the window
        assert!(!c.is_active("2024-06-30T00:00:00Z".parse().unwrap()));
        assert!(!c.is_active("2024-05-31T23:59:59Z".parse().unwrap()));
    }

    #[test]
    fn test_promotion_lookup_by_application() {
        let c = campaign("2024-06-01T00:00:00Z", "2024-06-30T00:00:00Z");
        assert_eq!(
            c.promotion_for(&ApplicationId::new("A1")),
            Some(&PromotionId::new("promo-1"))
        );
        assert!(c.promotion_for(&ApplicationId::new("A2")).is_none());
    }
}
