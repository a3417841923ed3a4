//! Typed extraction over shipment payloads.
//!
//! Every function here returns an explicit `Option` instead of scanning
//! dynamically at the call site, with documented precedence when a shipment
//! carries more than one candidate.

use super::types::{Bag, DeliveryAddress, Shipment, VIP_PRODUCT_TAG};

/// Suffix of the VIP-duration tag, e.g. `45_days`.
const DAYS_TAG_SUFFIX: &str = "_days";

/// A VIP-granting item found in a shipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipItem {
    pub uid: Option<i64>,
    pub code: Option<String>,
}

/// Find the VIP-granting item in a shipment's bags.
///
/// Precedence: the first bag (in delivery order) whose item tags include
/// `vip_product` wins; further VIP items in a multi-item order are not
/// separately processed.
#[must_use]
pub fn find_vip_item(bags: &[Bag]) -> Option<VipItem> {
    bags.iter()
        .filter_map(|bag| bag.item.as_ref())
        .find(|item| item.tags.iter().any(|t| t == VIP_PRODUCT_TAG))
        .map(|item| VipItem {
            uid: item.id,
            code: item.code.clone(),
        })
}

/// Parse the VIP duration from bag item tags.
///
/// Scans the flattened tag list across all bags and returns the number from
/// the first tag matching `<number>_days`. One duration applies to the whole
/// shipment, not per item; callers default to 0 days when absent.
#[must_use]
pub fn vip_days_from_tags(bags: &[Bag]) -> Option<u32> {
    bags.iter()
        .filter_map(|bag| bag.item.as_ref())
        .flat_map(|item| item.tags.iter())
        .find_map(|tag| parse_days_tag(tag))
}

/// Parse a single `<number>_days` tag.
fn parse_days_tag(tag: &str) -> Option<u32> {
    tag.strip_suffix(DAYS_TAG_SUFFIX)
        .and_then(|prefix| prefix.parse::<u32>().ok())
}

/// Buyer identity extracted from a shipment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Platform user ID for authenticated orders; `None` for anonymous ones.
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub anonymous: bool,
}

impl Identity {
    /// The key the member record is upserted under: the platform user ID,
    /// falling back to the delivery email, then phone, for anonymous orders.
    #[must_use]
    pub fn member_key(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.email.as_deref())
            .or(self.phone.as_deref())
    }
}

/// Extract buyer identity from a shipment.
///
/// Authenticated orders use the user's profile fields. Anonymous orders
/// derive first/last name by splitting the delivery display name on the
/// first space; a single-word name duplicates into both fields. The phone is
/// the delivery address dialing code concatenated with the local number.
#[must_use]
pub fn extract_identity(shipment: &Shipment) -> Identity {
    let address = shipment.delivery_address.as_ref();
    let phone = address.and_then(full_phone);

    match shipment.user.as_ref().filter(|u| !u.is_anonymous_user) {
        Some(user) => Identity {
            user_id: user.id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user
                .email
                .clone()
                .or_else(|| address.and_then(|a| a.email.clone())),
            phone: phone.or_else(|| user.mobile.clone()),
            anonymous: false,
        },
        None => {
            let (first_name, last_name) = address
                .and_then(|a| a.name.as_deref())
                .map(split_display_name)
                .unwrap_or_default();
            Identity {
                user_id: None,
                first_name,
                last_name,
                email: address.and_then(|a| a.email.clone()),
                phone,
                anonymous: true,
            }
        }
    }
}

/// Split a checkout display name on the first space.
fn split_display_name(name: &str) -> (Option<String>, Option<String>) {
    let name = name.trim();
    if name.is_empty() {
        return (None, None);
    }
    match name.split_once(' ') {
        Some((first, last)) => (Some(first.to_owned()), Some(last.trim().to_owned())),
        None => (Some(name.to_owned()), Some(name.to_owned())),
    }
}

/// Dialing code concatenated with the local number.
fn full_phone(address: &DeliveryAddress) -> Option<String> {
    let phone = address.phone.as_deref()?;
    Some(match address.country_phone_code.as_deref() {
        Some(code) => format!("{code}{phone}"),
        None => phone.to_owned(),
    })
}

/// Collect all promo/coupon identifiers applied across a shipment's bags.
///
/// Both promotion IDs and coupon codes count; order is preserved and
/// duplicates are dropped.
#[must_use]
pub fn collect_promo_ids(bags: &[Bag]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();

    for promo in bags.iter().flat_map(|bag| bag.applied_promos.iter()) {
        for id in [promo.promo_id.as_deref(), promo.code.as_deref()]
            .into_iter()
            .flatten()
        {
            if seen.insert(id.to_owned()) {
                ids.push(id.to_owned());
            }
        }
    }

    ids
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::events::types::{AppliedPromo, BagItem, ShipmentUser};

    fn bag_with_tags(id: i64, code: &str, tags: &[&str]) -> Bag {
        Bag {
            item: Some(BagItem {
                id: Some(id),
                code: Some(code.to_owned()),
                tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            }),
            applied_promos: Vec::new(),
        }
    }

    #[test]
    fn test_find_vip_item_first_match_wins() {
        let bags = vec![
            bag_with_tags(1, "PLAIN", &["apparel"]),
            bag_with_tags(2, "VIP-GOLD", &["vip_product"]),
            bag_with_tags(3, "VIP-SILVER", &["vip_product"]),
        ];

        let item = find_vip_item(&bags).unwrap();
        assert_eq!(item.uid, Some(2));
        assert_eq!(item.code.as_deref(), Some("VIP-GOLD"));
    }

    #[test]
    fn test_find_vip_item_none_when_untagged() {
        let bags = vec![bag_with_tags(1, "PLAIN", &["apparel"])];
        assert!(find_vip_item(&bags).is_none());
    }

    #[test]
    fn test_vip_days_from_tags() {
        let bags = vec![bag_with_tags(1, "VIP-GOLD", &["x", "45_days", "y"])];
        assert_eq!(vip_days_from_tags(&bags), Some(45));
    }

    #[test]
    fn test_vip_days_none_without_matching_tag() {
        let bags = vec![bag_with_tags(1, "VIP-GOLD", &["x", "y"])];
        assert_eq!(vip_days_from_tags(&bags), None);
    }

    #[test]
    fn test_vip_days_ignores_malformed_tags() {
        let bags = vec![bag_with_tags(1, "VIP-GOLD", &["some_days", "30_days"])];
        assert_eq!(vip_days_from_tags(&bags), Some(30));
    }

    #[test]
    fn test_split_two_word_name() {
        let shipment = Shipment {
            shipment_id: None,
            order_id: None,
            order_created: None,
            bags: Vec::new(),
            user: None,
            delivery_address: Some(DeliveryAddress {
                name: Some("Jane Doe".to_owned()),
                country_phone_code: Some("+1".to_owned()),
                phone: Some("5550100".to_owned()),
                email: Some("jane@example.com".to_owned()),
            }),
        };

        let identity = extract_identity(&shipment);
        assert_eq!(identity.first_name.as_deref(), Some("Jane"));
        assert_eq!(identity.last_name.as_deref(), Some("Doe"));
        assert_eq!(identity.phone.as_deref(), Some("+15550100"));
        assert!(identity.anonymous);
    }

    #[test]
    fn test_single_word_name_duplicates() {
        let shipment = Shipment {
            shipment_id: None,
            order_id: None,
            order_created: None,
            bags: Vec::new(),
            user: None,
            delivery_address: Some(DeliveryAddress {
                name: Some("Madonna".to_owned()),
                country_phone_code: None,
                phone: None,
                email: None,
            }),
        };

        let identity = extract_identity(&shipment);
        assert_eq!(identity.first_name.as_deref(), Some("Madonna"));
        assert_eq!(identity.last_name.as_deref(), Some("Madonna"));
    }

    #[test]
    fn test_authenticated_user_profile_wins() {
        let shipment = Shipment {
            shipment_id: None,
            order_id: None,
            order_created: None,
            bags: Vec::new(),
            user: Some(ShipmentUser {
                id: Some("u-1".to_owned()),
                first_name: Some("Ada".to_owned()),
                last_name: Some("Lovelace".to_owned()),
                email: Some("ada@example.com".to_owned()),
                mobile: None,
                is_anonymous_user: false,
            }),
            delivery_address: Some(DeliveryAddress {
                name: Some("Someone Else".to_owned()),
                country_phone_code: Some("+44".to_owned()),
                phone: Some("700900".to_owned()),
                email: None,
            }),
        };

        let identity = extract_identity(&shipment);
        assert_eq!(identity.user_id.as_deref(), Some("u-1"));
        assert_eq!(identity.first_name.as_deref(), Some("Ada"));
        assert_eq!(identity.phone.as_deref(), Some("+44700900"));
        assert!(!identity.anonymous);
        assert_eq!(identity.member_key(), Some("u-1"));
    }

    #[test]
    fn test_member_key_falls_back_for_anonymous() {
        let identity = Identity {
            user_id: None,
            email: Some("jane@example.com".to_owned()),
            ..Identity::default()
        };
        assert_eq!(identity.member_key(), Some("jane@example.com"));

        let identity = Identity {
            phone: Some("+15550100".to_owned()),
            ..Identity::default()
        };
        assert_eq!(identity.member_key(), Some("+15550100"));
    }

    #[test]
    fn test_collect_promo_ids_dedupes_preserving_order() {
        let bags = vec![
            Bag {
                item: None,
                applied_promos: vec![AppliedPromo {
                    promo_id: Some("p-1".to_owned()),
                    code: Some("SUMMER20".to_owned()),
                }],
            },
            Bag {
                item: None,
                applied_promos: vec![AppliedPromo {
                    promo_id: Some("p-1".to_owned()),
                    code: Some("SUMMER20".to_owned()),
                }],
            },
        ];

        assert_eq!(collect_promo_ids(&bags), vec!["p-1", "SUMMER20"]);
    }
}
