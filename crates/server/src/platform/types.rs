//! Request and response types for the platform API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use velvet_rope_core::{GroupId, ItemUid};

// =============================================================================
// User attribute definitions
// =============================================================================

/// Request to create a boolean user-attribute definition.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeDefinitionRequest {
    /// Humanized display name (e.g. "Custom Promotions").
    pub name: String,
    /// Stable slug, the lower-cased benefit title.
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: String,
    pub customer_editable: bool,
    pub encrypted: bool,
}

impl AttributeDefinitionRequest {
    /// Build the standard boolean attribute request for a benefit.
    #[must_use]
    pub fn boolean(name: String, slug: String, description: String) -> Self {
        Self {
            name,
            slug,
            kind: "boolean",
            description,
            customer_editable: false,
            encrypted: false,
        }
    }
}

/// Response from attribute definition creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAttributeDefinition {
    #[serde(rename = "_id")]
    pub id: String,
}

/// Request to set a user's boolean attribute value.
#[derive(Debug, Clone, Serialize)]
pub struct SetUserAttributeRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub attribute: AttributeValue,
}

/// Attribute value wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct AttributeValue {
    pub value: bool,
}

impl SetUserAttributeRequest {
    /// Request setting a boolean attribute to `true`.
    #[must_use]
    pub const fn boolean_true() -> Self {
        Self {
            kind: "boolean",
            attribute: AttributeValue { value: true },
        }
    }
}

/// Response from setting a user attribute (body is not used beyond decoding).
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatedUserAttribute {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
}

// =============================================================================
// User groups
// =============================================================================

/// Request to create a conditional user group.
#[derive(Debug, Clone, Serialize)]
pub struct UserGroupRequest {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub conditions: Vec<GroupCondition>,
}

/// A single membership condition on a user group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupCondition {
    pub user_attribute_definition_id: String,
    pub value: bool,
    #[serde(rename = "type")]
    pub op: &'static str,
}

impl UserGroupRequest {
    /// Build the standard "attribute equals true" conditional group.
    #[must_use]
    pub fn equals_true(name: String, description: String, attribute_id: String) -> Self {
        Self {
            name,
            description,
            kind: "conditional",
            conditions: vec![GroupCondition {
                user_attribute_definition_id: attribute_id,
                value: true,
                op: "eq",
            }],
        }
    }
}

/// Response from user group creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedUserGroup {
    pub uid: GroupId,
}

// =============================================================================
// Promotions
// =============================================================================

/// A cart promotion payload.
///
/// Shape notes: the buy rule is referenced from the discount rule by name
/// (`"( rule#1 )"`), product scoping lives in `buy_rules`, the user-group
/// restriction scopes the promotion to provisioned VIP members, and
/// exclusivity applies at cart level.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionPayload {
    pub name: String,
    pub mode: &'static str,
    pub promo_group: &'static str,
    pub promotion_type: String,
    pub application_id: String,
    pub apply_exclusive: &'static str,
    pub discount_rules: Vec<DiscountRule>,
    pub buy_rules: BTreeMap<String, BuyRule>,
    pub restrictions: PromotionRestrictions,
    #[serde(rename = "_schedule")]
    pub schedule: PromotionSchedule,
    pub display_meta: DisplayMeta,
}

/// A discount rule tied to a named buy rule.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountRule {
    pub buy_condition: String,
    pub discount_qty: u32,
    pub offer: Offer,
}

/// The discount offer; exactly one of the fields is set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Offer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<String>,
}

/// Item scoping for a named buy rule.
#[derive(Debug, Clone, Serialize)]
pub struct BuyRule {
    pub item_id: Vec<ItemUid>,
}

/// Who the promotion applies to.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionRestrictions {
    pub user_groups: Vec<GroupId>,
    pub anonymous_users: bool,
}

/// Promotion validity window.
#[derive(Debug, Clone, Serialize)]
pub struct PromotionSchedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub published: bool,
}

/// Storefront-facing promotion copy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DisplayMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Response from promotion creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPromotion {
    #[serde(rename = "_id")]
    pub id: String,
}

// =============================================================================
// Catalog / configuration reads
// =============================================================================

/// A page of catalog products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub items: Vec<Product>,
    #[serde(default)]
    pub page: Option<PageInfo>,
}

/// A catalog product (the subset the dashboard needs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub uid: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub item_code: Option<String>,
    #[serde(default)]
    pub brand: Option<serde_json::Value>,
    #[serde(default)]
    pub media: Option<serde_json::Value>,
}

/// Pagination info echoed by catalog endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub current: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub item_total: Option<u64>,
}

/// A sales channel (application) under a company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<serde_json::Value>,
    #[serde(default)]
    pub logo: Option<String>,
}

/// A page of applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationPage {
    #[serde(default)]
    pub items: Vec<Application>,
    #[serde(default)]
    pub page: Option<PageInfo>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_request_shape() {
        let req = AttributeDefinitionRequest::boolean(
            "Custom Promotions".to_owned(),
            "custom_promotions".to_owned(),
            "Grants access to member-only promotions".to_owned(),
        );
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["type"], "boolean");
        assert_eq!(value["slug"], "custom_promotions");
        assert_eq!(value["customer_editable"], false);
        assert_eq!(value["encrypted"], false);
    }

    #[test]
    fn test_group_request_condition_shape() {
        let req = UserGroupRequest::equals_true(
            "CUSTOM_PROMOTIONS".to_owned(),
            "Members with custom promotions".to_owned(),
            "attr-1".to_owned(),
        );
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["type"], "conditional");
        assert_eq!(value["conditions"][0]["user_attribute_definition_id"], "attr-1");
        assert_eq!(value["conditions"][0]["value"], true);
        assert_eq!(value["conditions"][0]["type"], "eq");
    }

    #[test]
    fn test_set_attribute_request_shape() {
        let value = serde_json::to_value(SetUserAttributeRequest::boolean_true()).unwrap();
        assert_eq!(value["type"], "boolean");
        assert_eq!(value["attribute"]["value"], true);
    }

    #[test]
    fn test_offer_omits_unset_variant() {
        let offer = Offer {
            discount_percentage: Some("20".to_owned()),
            discount_amount: None,
        };
        let value = serde_json::to_value(&offer).unwrap();
        assert_eq!(value["discount_percentage"], "20");
        assert!(value.get("discount_amount").is_none());
    }
}
