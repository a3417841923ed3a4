//! Shipment event processing.
//!
//! Consumes shipment-created/updated webhooks and runs the enrollment
//! pipeline: classify the shipment as VIP-item-bearing, upsert the member
//! record with the benefit grant and expiry, flip the member's remote
//! boolean attribute, and - independently - attribute the order to an
//! active campaign for analytics.
//!
//! Each step's outcome (ok / failed / skipped) is recorded to the
//! `shipment_events` ledger, so a remote failure after a local write is
//! visible for later reconciliation rather than silently diverging. Remote
//! and per-step failures never abort the remaining steps.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};

use velvet_rope_core::{ApplicationId, BenefitTitle, CompanyId, MemberId, OrderId, PromotionId, ShipmentId};

use crate::db::campaigns::Campaign;
use crate::db::shipment_events::{EventRecord, StepOutcome};
use crate::db::users::VipUserUpsert;
use crate::db::vip_configs::VipConfig;
use crate::db::{analytics, campaigns, sessions, shipment_events, users};
use crate::events::{Identity, Shipment, WebhookPayload, collect_promo_ids, extract_identity, find_vip_item, vip_days_from_tags};
use crate::platform::PlatformClient;

/// Milliseconds per VIP day; expiry = order date + days * this.
const MS_PER_DAY: i64 = 86_400_000;

/// Summary of one processed event.
#[derive(Debug)]
pub struct ProcessSummary {
    pub enrolled: bool,
    pub attributed: bool,
    pub steps: Vec<StepOutcome>,
}

/// Shipment event processor.
pub struct ShipmentProcessor {
    pool: PgPool,
    platform: PlatformClient,
}

impl ShipmentProcessor {
    /// Create a new shipment processor.
    #[must_use]
    pub const fn new(pool: PgPool, platform: PlatformClient) -> Self {
        Self { pool, platform }
    }

    /// Process one shipment webhook end to end.
    ///
    /// Never fails the caller: every internal failure is caught, logged, and
    /// recorded as a ledger step. The webhook is answered 200 regardless.
    #[instrument(skip(self, payload, config), fields(event = %event_name, company = %company_id, app = %application_id))]
    pub async fn process(
        &self,
        event_name: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        payload: &WebhookPayload,
        config: Option<&VipConfig>,
    ) -> ProcessSummary {
        let mut steps = Vec::new();
        let mut enrolled = false;
        let mut attributed = false;

        let Some(shipment) = payload.shipment.as_ref() else {
            warn!("Webhook payload has no shipment, ignoring");
            steps.push(StepOutcome::skipped("classify", "no shipment in payload"));
            self.record(event_name, company_id, application_id, None, &steps)
                .await;
            return ProcessSummary {
                enrolled,
                attributed,
                steps,
            };
        };

        let identity = extract_identity(shipment);

        // VIP enrollment
        match (find_vip_item(&shipment.bags), config) {
            (None, _) => {
                steps.push(StepOutcome::skipped("classify", "no vip item in shipment"));
            }
            (Some(_), None) => {
                steps.push(StepOutcome::skipped(
                    "classify",
                    "company has no vip configuration",
                ));
            }
            (Some(item), Some(config)) => {
                steps.push(StepOutcome::ok("classify"));

                match config.benefit_for_item(item.uid, item.code.as_deref()) {
                    None => {
                        info!(
                            uid = ?item.uid,
                            code = ?item.code,
                            "VIP item matches no configured benefit, skipping enrollment"
                        );
                        steps.push(StepOutcome::skipped(
                            "enroll",
                            "item matches no configured benefit",
                        ));
                    }
                    Some(vip_product) => {
                        enrolled = self
                            .enroll(
                                company_id,
                                application_id,
                                config,
                                shipment,
                                &identity,
                                &vip_product.benefit_title,
                                &mut steps,
                            )
                            .await;
                    }
                }
            }
        }

        // Promotion attribution, independent of enrollment
        let (step, did_attribute) = self
            .attribute_order(company_id, application_id, shipment, &identity)
            .await;
        steps.push(step);
        attributed = did_attribute;

        self.record(
            event_name,
            company_id,
            application_id,
            Some(shipment),
            &steps,
        )
        .await;

        ProcessSummary {
            enrolled,
            attributed,
            steps,
        }
    }

    /// Upsert the member record and flip the remote attribute.
    ///
    /// Returns whether the local upsert succeeded. A failing remote flip is
    /// recorded but does not roll the upsert back.
    #[allow(clippy::too_many_arguments)]
    async fn enroll(
        &self,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        config: &VipConfig,
        shipment: &Shipment,
        identity: &Identity,
        benefit_title: &str,
        steps: &mut Vec<StepOutcome>,
    ) -> bool {
        let Ok(benefit) = BenefitTitle::parse(benefit_title) else {
            steps.push(StepOutcome::failed("enroll", "configured benefit title is empty"));
            return false;
        };

        let Some(member_key) = identity.member_key() else {
            steps.push(StepOutcome::skipped(
                "enroll",
                "shipment carries no usable member key",
            ));
            return false;
        };
        let member_id = MemberId::new(member_key);

        let vip_days = vip_days_from_tags(&shipment.bags).unwrap_or(0);
        let order_created = shipment.order_created.unwrap_or_else(Utc::now);

        let upsert = build_user_upsert(
            identity,
            &member_id,
            application_id,
            shipment.order_id.as_deref(),
            &benefit,
            order_created,
            vip_days,
        );

        if let Err(e) = users::upsert(&self.pool, company_id, &upsert).await {
            error!(member = %member_id, error = %e, "Member upsert failed");
            steps.push(StepOutcome::failed("enroll", e.to_string()));
            return false;
        }
        info!(member = %member_id, benefit = %benefit, days = vip_days, "Member enrolled");
        steps.push(StepOutcome::ok("enroll"));

        steps.push(
            self.flip_remote_attribute(company_id, application_id, config, &benefit, identity)
                .await,
        );

        true
    }

    /// PUT the member's boolean attribute to true on the platform.
    async fn flip_remote_attribute(
        &self,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        config: &VipConfig,
        benefit: &BenefitTitle,
        identity: &Identity,
    ) -> StepOutcome {
        const STEP: &str = "remote_attribute";

        let Some(user_id) = identity.user_id.as_deref() else {
            return StepOutcome::skipped(STEP, "anonymous order has no platform user");
        };

        let Some(attribute) = config.attribute_for(application_id, benefit) else {
            return StepOutcome::skipped(STEP, "no attribute provisioned for application");
        };

        let token = match sessions::latest_session(&self.pool).await {
            Ok(session) => session.access_token,
            Err(e) => {
                error!(error = %e, "No platform session for attribute update");
                return StepOutcome::failed(STEP, e.to_string());
            }
        };

        match self
            .platform
            .set_user_attribute_true(
                &token,
                company_id,
                application_id,
                &attribute.attribute_id,
                &MemberId::new(user_id),
            )
            .await
        {
            Ok(()) => StepOutcome::ok(STEP),
            Err(e) => {
                // Local and remote state diverge here; the ledger row is the
                // reconciliation hook.
                error!(error = %e, "Remote attribute update failed");
                StepOutcome::failed(STEP, e.to_string())
            }
        }
    }

    /// Match the shipment's applied promotions against active campaigns and
    /// record an attribution row on a hit.
    async fn attribute_order(
        &self,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        shipment: &Shipment,
        identity: &Identity,
    ) -> (StepOutcome, bool) {
        const STEP: &str = "attribution";

        let applied = collect_promo_ids(&shipment.bags);
        if applied.is_empty() {
            return (
                StepOutcome::skipped(STEP, "no promotions applied to shipment"),
                false,
            );
        }

        let Some(order_id) = shipment.order_id.as_deref() else {
            return (StepOutcome::skipped(STEP, "shipment has no order id"), false);
        };

        let active = match campaigns::active_for_company(&self.pool, company_id, Utc::now()).await {
            Ok(active) => active,
            Err(e) => {
                error!(error = %e, "Campaign lookup failed");
                return (StepOutcome::failed(STEP, e.to_string()), false);
            }
        };

        let Some((campaign, promotion_id)) = match_attribution(&active, application_id, &applied)
        else {
            return (
                StepOutcome::skipped(STEP, "no active campaign matched applied promotions"),
                false,
            );
        };

        let record = analytics::Attribution {
            company_id: company_id.clone(),
            application_id: application_id.clone(),
            order_id: OrderId::new(order_id),
            campaign_id: campaign.campaign_id,
            promotion_id: promotion_id.clone(),
            promotion_type: campaign.benefit_type.clone(),
            user_id: identity.user_id.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
        };

        match analytics::insert(&self.pool, &record).await {
            Ok(true) => {
                info!(campaign = %campaign.campaign_id, order = %order_id, "Order attributed");
                (StepOutcome::ok(STEP), true)
            }
            Ok(false) => (
                StepOutcome::skipped(STEP, "order already attributed to this campaign"),
                false,
            ),
            Err(e) => {
                error!(error = %e, "Attribution insert failed");
                (StepOutcome::failed(STEP, e.to_string()), false)
            }
        }
    }

    /// Append the event row; a ledger failure is logged, never surfaced.
    async fn record(
        &self,
        event_name: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        shipment: Option<&Shipment>,
        steps: &[StepOutcome],
    ) {
        let order_id = shipment.and_then(|s| s.order_id.as_deref()).map(OrderId::new);
        let shipment_id = shipment
            .and_then(|s| s.shipment_id.as_deref())
            .map(ShipmentId::new);

        let event = EventRecord {
            company_id,
            application_id,
            order_id: order_id.as_ref(),
            shipment_id: shipment_id.as_ref(),
            event_name,
        };

        if let Err(e) = shipment_events::record(&self.pool, &event, steps).await {
            error!(error = %e, "Failed to record shipment event ledger");
        }
    }
}

/// Build the member upsert for a benefit grant.
///
/// The expiry is the order date plus the VIP duration expressed in
/// milliseconds (`days * 86_400_000`).
#[must_use]
pub fn build_user_upsert(
    identity: &Identity,
    member_id: &MemberId,
    application_id: &ApplicationId,
    order_id: Option<&str>,
    benefit: &BenefitTitle,
    order_created: DateTime<Utc>,
    vip_days: u32,
) -> VipUserUpsert {
    let expires_at = order_created + Duration::milliseconds(i64::from(vip_days) * MS_PER_DAY);

    let benefits = serde_json::json!({
        benefit.as_str(): {
            "granted": true,
            "expires_at": expires_at,
        }
    });

    VipUserUpsert {
        user_id: member_id.clone(),
        first_name: identity.first_name.clone(),
        last_name: identity.last_name.clone(),
        email: identity.email.clone(),
        phone: identity.phone.clone(),
        application_id: application_id.clone(),
        order_id: order_id.map(OrderId::new),
        vip_days: i32::try_from(vip_days).unwrap_or(i32::MAX),
        benefits,
    }
}

/// Find the active campaign whose recorded promotion for this application
/// appears among the shipment's applied promo identifiers.
///
/// Campaigns are checked in the order given; the first hit wins.
#[must_use]
pub fn match_attribution<'a>(
    campaigns: &'a [Campaign],
    application_id: &ApplicationId,
    applied: &[String],
) -> Option<(&'a Campaign, &'a PromotionId)> {
    campaigns
        .iter()
        .filter(|c| c.application_ids.contains(application_id))
        .find_map(|campaign| {
            campaign
                .promotion_for(application_id)
                .filter(|promotion| applied.iter().any(|a| a == promotion.as_str()))
                .map(|promotion| (campaign, promotion))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use velvet_rope_core::CampaignId;

    #[test]
    fn test_expiry_is_order_date_plus_days_in_millis() {
        let identity = Identity::default();
        let order_created: DateTime<Utc> = "2024-06-15T10:00:00Z".parse().unwrap();
        let benefit = BenefitTitle::parse("CUSTOM_PROMOTIONS").unwrap();

        let upsert = build_user_upsert(
            &identity,
            &MemberId::new("u-1"),
            &ApplicationId::new("A1"),
            Some("o-1"),
            &benefit,
            order_created,
            45,
        );

        let expected = order_created + Duration::milliseconds(45 * 86_400_000);
        let grant = &upsert.benefits["CUSTOM_PROMOTIONS"];
        assert_eq!(grant["granted"], true);
        assert_eq!(
            grant["expires_at"],
            serde_json::to_value(expected).unwrap()
        );
        assert_eq!(upsert.vip_days, 45);
    }

    #[test]
    fn test_zero_days_expires_at_order_date() {
        let order_created: DateTime<Utc> = "2024-06-15T10:00:00Z".parse().unwrap();
        let benefit = BenefitTitle::parse("EARLY_ACCESS").unwrap();

        let upsert = build_user_upsert(
            &Identity::default(),
            &MemberId::new("u-1"),
            &ApplicationId::new("A1"),
            None,
            &benefit,
            order_created,
            0,
        );

        assert_eq!(
            upsert.benefits["EARLY_ACCESS"]["expires_at"],
            serde_json::to_value(order_created).unwrap()
        );
    }

    fn active_campaign(app: &str, promotion: &str) -> Campaign {
        Campaign {
            campaign_id: CampaignId::new(654_321),
            company_id: CompanyId::new("42"),
            name: "June VIP".to_owned(),
            benefit_type: "CUSTOM_PROMOTIONS".to_owned(),
            application_ids: vec![ApplicationId::new(app)],
            promotions: BTreeMap::from([(
                app.to_owned(),
                PromotionId::new(promotion),
            )]),
            products: Vec::new(),
            discount: None,
            start_date: "2024-06-01T00:00:00Z".parse().unwrap(),
            end_date: "2024-06-30T00:00:00Z".parse().unwrap(),
            pre_launch_days: 0,
            offer_text: None,
            offer_label: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_attribution_matches_recorded_promotion() {
        let campaigns = vec![active_campaign("A1", "promo-1")];
        let applied = vec!["other".to_owned(), "promo-1".to_owned()];

        let (campaign, promotion) =
            match_attribution(&campaigns, &ApplicationId::new("A1"), &applied).unwrap();
        assert_eq!(campaign.campaign_id, CampaignId::new(654_321));
        assert_eq!(promotion, &PromotionId::new("promo-1"));
    }

    #[test]
    fn test_attribution_requires_application_membership() {
        let campaigns = vec![active_campaign("A1", "promo-1")];
        let applied = vec!["promo-1".to_owned()];

        assert!(match_attribution(&campaigns, &ApplicationId::new("A2"), &applied).is_none());
    }

    #[test]
    fn test_attribution_requires_promo_intersection() {
        let campaigns = vec![active_campaign("A1", "promo-1")];
        let applied = vec!["unrelated".to_owned()];

        assert!(match_attribution(&campaigns, &ApplicationId::new("A1"), &applied).is_none());
    }
}
