//! Serde models for the shipment webhook payload.
//!
//! The platform fires these on shipment lifecycle events. Only the fields
//! this extension consumes are modeled; everything else in the payload is
//! ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use velvet_rope_core::{ApplicationId, CompanyId};

/// Tag marking a catalog item as VIP-granting.
pub const VIP_PRODUCT_TAG: &str = "vip_product";

/// The webhook envelope as delivered by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ShipmentWebhook {
    /// Event name, e.g. `shipment/create` or `shipment/update`.
    pub event: String,
    pub company_id: CompanyId,
    pub application_id: ApplicationId,
    #[serde(default)]
    pub payload: WebhookPayload,
}

/// Webhook payload body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub shipment: Option<Shipment>,
}

/// A shipment with its bags, buyer, and delivery details.
#[derive(Debug, Clone, Deserialize)]
pub struct Shipment {
    #[serde(default)]
    pub shipment_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    /// When the order was placed; the VIP expiry window starts here.
    #[serde(default)]
    pub order_created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bags: Vec<Bag>,
    /// Present for authenticated orders, absent for anonymous ones.
    #[serde(default)]
    pub user: Option<ShipmentUser>,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
}

/// One bag (line) of a shipment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bag {
    #[serde(default)]
    pub item: Option<BagItem>,
    #[serde(default)]
    pub applied_promos: Vec<AppliedPromo>,
}

/// The catalog item inside a bag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BagItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A promotion or coupon applied to a bag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppliedPromo {
    #[serde(default)]
    pub promo_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// The authenticated buyer's profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShipmentUser {
    #[serde(default, alias = "user_oid", alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub is_anonymous_user: bool,
}

/// Delivery address fields used for identity extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryAddress {
    /// Display name as entered at checkout, e.g. "Jane Doe".
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country_phone_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_decodes_minimal_body() {
        let body = serde_json::json!({
            "event": "shipment/create",
            "company_id": "42",
            "application_id": "app-1",
            "payload": {}
        });
        let webhook: ShipmentWebhook = serde_json::from_value(body).unwrap();
        assert!(webhook.payload.shipment.is_none());
        assert_eq!(webhook.event, "shipment/create");
    }

    #[test]
    fn test_shipment_decodes_bags_and_tags() {
        let body = serde_json::json!({
            "shipment_id": "s-1",
            "order_id": "o-1",
            "order_created": "2024-06-15T10:00:00Z",
            "bags": [
                { "item": { "id": 100, "code": "VIP-GOLD", "tags": ["vip_product", "45_days"] } }
            ]
        });
        let shipment: Shipment = serde_json::from_value(body).unwrap();
        let item = shipment.bags[0].item.as_ref().unwrap();
        assert_eq!(item.id, Some(100));
        assert!(item.tags.iter().any(|t| t == VIP_PRODUCT_TAG));
    }
}
