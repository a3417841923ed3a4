//! Campaign/promotion provisioning.
//!
//! A campaign targets a benefit type across a set of applications. For each
//! application with a provisioned user group, a cart promotion scoped to
//! that group is created remotely (unless the benefit type is
//! exclusivity-only, which carries no discount), and the per-application
//! promotion IDs are recorded on the inserted campaign document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use velvet_rope_core::{
    ApplicationId, BenefitTitle, CampaignId, CompanyId, DiscountKind, GroupId, ItemUid,
    PromotionId,
};

use crate::db::campaigns::{self, Campaign, Discount};
use crate::db::{RepositoryError, sessions, vip_configs};
use crate::error::AppError;
use crate::platform::{
    BuyRule, DiscountRule, DisplayMeta, Offer, PlatformClient, PromotionPayload,
    PromotionRestrictions, PromotionSchedule,
};

/// Attempts at generating a unique campaign ID before giving up.
const MAX_ID_ATTEMPTS: u32 = 5;

/// Campaign creation request from the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    /// Benefit type the campaign targets; doubles as the user group name.
    #[serde(rename = "type")]
    pub benefit_type: String,
    /// One ID or a list; a single ID normalizes to a list of one.
    #[serde(deserialize_with = "one_or_many")]
    pub application_ids: Vec<ApplicationId>,
    #[serde(default)]
    pub products: Vec<ItemUid>,
    #[serde(default)]
    pub discount: Option<Discount>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub pre_launch_days: i32,
    #[serde(default)]
    pub offer_text: Option<String>,
    #[serde(default)]
    pub offer_label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A failed promotion creation for one application.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionFailure {
    pub application_id: ApplicationId,
    pub error: String,
}

/// Result of campaign creation.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignOutcome {
    pub success: bool,
    pub campaign_id: CampaignId,
    pub failed: Vec<PromotionFailure>,
}

/// Campaign provisioning service.
pub struct CampaignService {
    pool: PgPool,
    platform: PlatformClient,
}

impl CampaignService {
    /// Create a new campaign service.
    #[must_use]
    pub const fn new(pool: PgPool, platform: PlatformClient) -> Self {
        Self { pool, platform }
    }

    /// Create a campaign and its per-application promotions.
    ///
    /// Applications without a provisioned user group for the campaign's
    /// benefit type are skipped: there is no audience to scope the promotion
    /// to. Remote failures are collected, not fatal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` on validation failures and
    /// `AppError::Database` if the session or campaign store fails.
    #[instrument(skip(self, request), fields(company = %company_id, campaign = %request.name))]
    pub async fn create_campaign(
        &self,
        company_id: &CompanyId,
        request: CreateCampaignRequest,
    ) -> Result<CampaignOutcome, AppError> {
        if request.application_ids.is_empty() {
            return Err(AppError::BadRequest("no applications selected".to_owned()));
        }
        if request.products.is_empty() {
            return Err(AppError::BadRequest("no products selected".to_owned()));
        }

        let benefit = BenefitTitle::parse(&request.benefit_type)
            .map_err(|e| AppError::BadRequest(format!("invalid campaign type: {e}")))?;

        if !benefit.is_product_exclusivity() && request.discount.is_none() {
            return Err(AppError::BadRequest(
                "discount is required for campaigns of this type".to_owned(),
            ));
        }

        let session = sessions::latest_session(&self.pool).await?;
        let config = vip_configs::get(&self.pool, company_id).await?;

        let mut promotions = BTreeMap::new();
        let mut failed = Vec::new();

        for application_id in &request.application_ids {
            let Some(group) = config
                .as_ref()
                .and_then(|c| c.group_for(application_id, &benefit))
            else {
                debug!(
                    app = %application_id,
                    benefit = %benefit,
                    "No user group provisioned, skipping application"
                );
                continue;
            };

            if benefit.is_product_exclusivity() {
                continue;
            }

            let payload = build_promotion_payload(&request, application_id, group.group_id);

            match self
                .platform
                .create_promotion(&session.access_token, company_id, application_id, &payload)
                .await
            {
                Ok(promotion_id) => {
                    info!(app = %application_id, promotion = %promotion_id, "Created promotion");
                    promotions.insert(application_id.as_str().to_owned(), promotion_id);
                }
                Err(e) => {
                    error!(app = %application_id, error = %e, "Promotion creation failed");
                    failed.push(PromotionFailure {
                        application_id: application_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let campaign_id = self.insert_campaign(company_id, &request, promotions).await?;

        Ok(CampaignOutcome {
            success: true,
            campaign_id,
            failed,
        })
    }

    /// Insert the campaign document, regenerating the 6-digit ID on a
    /// uniqueness conflict.
    async fn insert_campaign(
        &self,
        company_id: &CompanyId,
        request: &CreateCampaignRequest,
        promotions: BTreeMap<String, PromotionId>,
    ) -> Result<CampaignId, AppError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let campaign_id = generate_campaign_id();
            let campaign = Campaign {
                campaign_id,
                company_id: company_id.clone(),
                name: request.name.clone(),
                benefit_type: request.benefit_type.clone(),
                application_ids: request.application_ids.clone(),
                promotions: promotions.clone(),
                products: request.products.clone(),
                discount: request.discount.clone(),
                start_date: request.start_date,
                end_date: request.end_date,
                pre_launch_days: request.pre_launch_days,
                offer_text: request.offer_text.clone(),
                offer_label: request.offer_label.clone(),
                description: request.description.clone(),
                created_at: Utc::now(),
            };

            match campaigns::insert(&self.pool, &campaign).await {
                Ok(()) => return Ok(campaign_id),
                Err(RepositoryError::Conflict(_)) => {
                    debug!(campaign_id = %campaign_id, "Campaign ID collision, regenerating");
                }
                Err(e) => return Err(AppError::Database(e)),
            }
        }

        Err(AppError::Internal(
            "could not allocate a unique campaign id".to_owned(),
        ))
    }
}

/// Build the cart promotion payload for one application.
///
/// Buy rule `rule#1` restricts the promotion to the campaign's product UIDs;
/// the discount rule references it by name and carries the discount as a
/// string value; the user-group restriction scopes it to provisioned VIP
/// members; the schedule spans the campaign window.
#[must_use]
pub fn build_promotion_payload(
    request: &CreateCampaignRequest,
    application_id: &ApplicationId,
    group_id: GroupId,
) -> PromotionPayload {
    let offer = match request.discount.as_ref() {
        Some(Discount {
            kind: DiscountKind::Percentage,
            value,
        }) => Offer {
            discount_percentage: Some(value.clone()),
            discount_amount: None,
        },
        Some(Discount {
            kind: DiscountKind::Amount,
            value,
        }) => Offer {
            discount_percentage: None,
            discount_amount: Some(value.clone()),
        },
        None => Offer::default(),
    };

    let promotion_type = request
        .discount
        .as_ref()
        .map_or("percentage", |d| d.kind.as_str());

    PromotionPayload {
        name: request.name.clone(),
        mode: "promotion",
        promo_group: "product",
        promotion_type: promotion_type.to_owned(),
        application_id: application_id.as_str().to_owned(),
        apply_exclusive: "cart",
        discount_rules: vec![DiscountRule {
            buy_condition: "( rule#1 )".to_owned(),
            discount_qty: 1,
            offer,
        }],
        buy_rules: BTreeMap::from([(
            "rule#1".to_owned(),
            BuyRule {
                item_id: request.products.clone(),
            },
        )]),
        restrictions: PromotionRestrictions {
            user_groups: vec![group_id],
            anonymous_users: false,
        },
        schedule: PromotionSchedule {
            start: request.start_date,
            end: request.end_date,
            published: true,
        },
        display_meta: DisplayMeta {
            name: request.name.clone(),
            offer_text: request.offer_text.clone(),
            offer_label: request.offer_label.clone(),
            description: request.description.clone(),
        },
    }
}

/// Generate a 6-digit campaign identifier.
///
/// The last four digits of the millisecond clock and a 2-digit random salt
/// are folded into the `100_000..=999_999` range, so the result is always a
/// true 6-digit integer. Uniqueness is enforced by the campaigns table;
/// callers retry on conflict.
#[must_use]
pub fn generate_campaign_id() -> CampaignId {
    let millis = Utc::now().timestamp_millis();
    let stamp = i32::try_from(millis % 10_000).unwrap_or(0);
    let salt = rand::rng().random_range(0..100_i32);
    CampaignId::new(100_000 + (stamp * 100 + salt) % 900_000)
}

/// Accept either a bare application ID or a list of them.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<ApplicationId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(ApplicationId),
        Many(Vec<ApplicationId>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(id) => vec![id],
        OneOrMany::Many(ids) => ids,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> CreateCampaignRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Summer VIP",
            "type": "CUSTOM_PROMOTIONS",
            "application_ids": ["A1"],
            "products": [100, 101],
            "discount": { "type": "percentage", "value": "20" },
            "start_date": "2024-06-01T00:00:00Z",
            "end_date": "2024-06-30T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_single_application_id_normalizes_to_list() {
        let parsed: CreateCampaignRequest = serde_json::from_value(serde_json::json!({
            "name": "Summer VIP",
            "type": "CUSTOM_PROMOTIONS",
            "application_ids": "A1",
            "products": [100],
            "start_date": "2024-06-01T00:00:00Z",
            "end_date": "2024-06-30T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(parsed.application_ids, vec![ApplicationId::new("A1")]);
    }

    #[test]
    fn test_promotion_payload_shape() {
        let payload =
            build_promotion_payload(&request(), &ApplicationId::new("A1"), GroupId::new(7));
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            value["discount_rules"][0]["offer"]["discount_percentage"],
            "20"
        );
        assert_eq!(
            value["buy_rules"]["rule#1"]["item_id"],
            serde_json::json!([100, 101])
        );
        assert_eq!(value["restrictions"]["user_groups"], serde_json::json!([7]));
        assert_eq!(value["restrictions"]["anonymous_users"], false);
        assert_eq!(value["apply_exclusive"], "cart");
        assert_eq!(value["_schedule"]["start"], "2024-06-01T00:00:00Z");
        assert_eq!(value["_schedule"]["end"], "2024-06-30T00:00:00Z");
        assert_eq!(value["promotion_type"], "percentage");
    }

    #[test]
    fn test_amount_discount_uses_amount_field() {
        let mut req = request();
        req.discount = Some(Discount {
            kind: DiscountKind::Amount,
            value: "250".to_owned(),
        });

        let payload = build_promotion_payload(&req, &ApplicationId::new("A1"), GroupId::new(7));
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["discount_rules"][0]["offer"]["discount_amount"], "250");
        assert!(
            value["discount_rules"][0]["offer"]
                .get("discount_percentage")
                .is_none()
        );
        assert_eq!(value["promotion_type"], "amount");
    }

    #[test]
    fn test_campaign_id_is_always_six_digits() {
        for _ in 0..1_000 {
            let id = generate_campaign_id();
            assert!(id.is_six_digits(), "generated {id}");
        }
    }
}
