//! VIP configuration repository.
//!
//! One row per company holding the benefit catalog, the VIP product
//! associations, the configured sales channels, and the maps of remotely
//! provisioned user-attribute-definition and user-group IDs.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

use velvet_rope_core::{ApplicationId, AttributeId, BenefitTitle, CompanyId, GroupId};

use super::RepositoryError;

/// A benefit a company has in its catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benefit {
    pub title: String,
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

/// The catalog product whose purchase grants a benefit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRef {
    /// Platform item identifier.
    pub uid: i64,
    /// Catalog item code, matched against shipment bag items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Association of a benefit with its granting product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipProduct {
    pub benefit_title: String,
    pub product: ProductRef,
}

/// A remotely provisioned user-attribute definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeRef {
    pub attribute_id: AttributeId,
    pub name: String,
}

/// A remotely provisioned user group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRef {
    pub group_id: GroupId,
    pub name: String,
}

/// Per-company VIP configuration document.
///
/// The two ID maps are keyed by application ID. The invariant they protect:
/// a (benefit title, application) pair is provisioned remotely at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VipConfig {
    pub company_id: CompanyId,
    #[serde(default)]
    pub benefits: Vec<Benefit>,
    #[serde(default)]
    pub vip_products: Vec<VipProduct>,
    #[serde(default)]
    pub application_ids: Vec<ApplicationId>,
    #[serde(default)]
    pub user_attribute_ids: BTreeMap<String, Vec<AttributeRef>>,
    #[serde(default)]
    pub user_group_ids: BTreeMap<String, Vec<GroupRef>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VipConfig {
    /// An empty configuration for a company that has not configured anything.
    #[must_use]
    pub fn empty(company_id: CompanyId) -> Self {
        let now = Utc::now();
        Self {
            company_id,
            benefits: Vec::new(),
            vip_products: Vec::new(),
            application_ids: Vec::new(),
            user_attribute_ids: BTreeMap::new(),
            user_group_ids: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Slugs of plans already provisioned for an application.
    #[must_use]
    pub fn provisioned_slugs(&self, application_id: &ApplicationId) -> HashSet<String> {
        self.user_attribute_ids
            .get(application_id.as_str())
            .map(|attrs| attrs.iter().map(|a| a.name.to_lowercase()).collect())
            .unwrap_or_default()
    }

    /// The attribute provisioned for a benefit on an application, if any.
    #[must_use]
    pub fn attribute_for(
        &self,
        application_id: &ApplicationId,
        benefit: &BenefitTitle,
    ) -> Option<&AttributeRef> {
        self.user_attribute_ids
            .get(application_id.as_str())?
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(benefit.as_str()))
    }

    /// The user group provisioned for a benefit on an application, if any.
    #[must_use]
    pub fn group_for(
        &self,
        application_id: &ApplicationId,
        benefit: &BenefitTitle,
    ) -> Option<&GroupRef> {
        self.user_group_ids
            .get(application_id.as_str())?
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(benefit.as_str()))
    }

    /// Resolve which benefit a shipped item grants, by item code first and
    /// platform UID second.
    #[must_use]
    pub fn benefit_for_item(&self, uid: Option<i64>, code: Option<&str>) -> Option<&VipProduct> {
        if let Some(code) = code
            && let Some(found) = self
                .vip_products
                .iter()
                .find(|vp| vp.product.item_code.as_deref() == Some(code))
        {
            return Some(found);
        }

        uid.and_then(|uid| self.vip_products.iter().find(|vp| vp.product.uid == uid))
    }
}

/// Fetch a company's VIP configuration.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails and
/// `RepositoryError::DataCorruption` if a stored JSONB column does not decode.
pub async fn get(pool: &PgPool, company_id: &CompanyId) -> Result<Option<VipConfig>, RepositoryError> {
    let row = sqlx::query(
        r"
        SELECT company_id, benefits, vip_products, application_ids,
               user_attribute_ids, user_group_ids, created_at, updated_at
        FROM vip_configs
        WHERE company_id = $1
        ",
    )
    .bind(company_id.as_str())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(decode_row(&row)?))
}

/// Upsert a company's full configuration document.
///
/// Callers merge in memory first (benefit catalog deduplicated by title,
/// application IDs unioned, ID maps extended); this write replaces the row's
/// JSONB columns with the merged result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn upsert(pool: &PgPool, config: &VipConfig) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO vip_configs
            (company_id, benefits, vip_products, application_ids,
             user_attribute_ids, user_group_ids, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        ON CONFLICT (company_id) DO UPDATE SET
            benefits = EXCLUDED.benefits,
            vip_products = EXCLUDED.vip_products,
            application_ids = EXCLUDED.application_ids,
            user_attribute_ids = EXCLUDED.user_attribute_ids,
            user_group_ids = EXCLUDED.user_group_ids,
            updated_at = now()
        ",
    )
    .bind(config.company_id.as_str())
    .bind(encode("benefits", &config.benefits)?)
    .bind(encode("vip_products", &config.vip_products)?)
    .bind(encode("application_ids", &config.application_ids)?)
    .bind(encode("user_attribute_ids", &config.user_attribute_ids)?)
    .bind(encode("user_group_ids", &config.user_group_ids)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace a company's VIP product associations, leaving the rest untouched.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the write fails.
pub async fn set_vip_products(
    pool: &PgPool,
    company_id: &CompanyId,
    vip_products: &[VipProduct],
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO vip_configs (company_id, vip_products, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (company_id) DO UPDATE SET
            vip_products = EXCLUDED.vip_products,
            updated_at = now()
        ",
    )
    .bind(company_id.as_str())
    .bind(encode("vip_products", &vip_products)?)
    .execute(pool)
    .await?;

    Ok(())
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<VipConfig, RepositoryError> {
    let company_id: String = row.try_get("company_id")?;

    Ok(VipConfig {
        company_id: CompanyId::new(company_id),
        benefits: decode(row, "benefits")?,
        vip_products: decode(row, "vip_products")?,
        application_ids: decode(row, "application_ids")?,
        user_attribute_ids: decode(row, "user_attribute_ids")?,
        user_group_ids: decode(row, "user_group_ids")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
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

    fn config_with_provisioned(app: &str, titles: &[&str]) -> VipConfig {
        let mut config = VipConfig::empty(CompanyId::new("42"));
        config.user_attribute_ids.insert(
            app.to_owned(),
            titles
                .iter()
                .map(|t| AttributeRef {
                    attribute_id: AttributeId::new(format!("attr-{t}")),
                    name: (*t).to_owned(),
                })
                .collect(),
        );
        config.user_group_ids.insert(
            app.to_owned(),
            titles
                .iter()
                .map(|t| GroupRef {
                    group_id: GroupId::new(7),
                    name: (*t).to_owned(),
                })
                .collect(),
        );
        config
    }

    #[test]
    fn test_provisioned_slugs_lowercases_titles() {
        let config = config_with_provisioned("app-1", &["CUSTOM_PROMOTIONS"]);
        let slugs = config.provisioned_slugs(&ApplicationId::new("app-1"));
        assert!(slugs.contains("custom_promotions"));
        assert_eq!(slugs.len(), 1);
    }

    #[test]
    fn test_provisioned_slugs_empty_for_unknown_app() {
        let config = config_with_provisioned("app-1", &["CUSTOM_PROMOTIONS"]);
        assert!(
            config
                .provisioned_slugs(&ApplicationId::new("app-2"))
                .is_empty()
        );
    }

    #[test]
    fn test_group_lookup_is_case_insensitive() {
        let config = config_with_provisioned("app-1", &["CUSTOM_PROMOTIONS"]);
        let title = BenefitTitle::parse("custom_promotions").unwrap();
        assert!(
            config
                .group_for(&ApplicationId::new("app-1"), &title)
                .is_some()
        );
    }

    #[test]
    fn test_benefit_for_item_prefers_code_over_uid() {
        let mut config = VipConfig::empty(CompanyId::new("42"));
        config.vip_products = vec![
            VipProduct {
                benefit_title: "CUSTOM_PROMOTIONS".to_owned(),
                product: ProductRef {
                    uid: 100,
                    item_code: Some("VIP-GOLD".to_owned()),
                    name: None,
                },
            },
            VipProduct {
                benefit_title: "EARLY_ACCESS".to_owned(),
                product: ProductRef {
                    uid: 200,
                    item_code: Some("VIP-SILVER".to_owned()),
                    name: None,
                },
            },
        ];

        // Code wins even when the uid points at a different entry
        let found = config.benefit_for_item(Some(200), Some("VIP-GOLD")).unwrap();
        assert_eq!(found.benefit_title, "CUSTOM_PROMOTIONS");

        // Falls back to uid when the code is unknown
        let found = config.benefit_for_item(Some(200), Some("nope")).unwrap();
        assert_eq!(found.benefit_title, "EARLY_ACCESS");

        assert!(config.benefit_for_item(Some(999), Some("nope")).is_none());
    }
}
