//! Plan/attribute provisioning.
//!
//! For each selected application and each newly enabled benefit plan, create
//! a remote boolean user-attribute definition and a conditional user group,
//! and record the resulting IDs in the company's configuration. Provisioning
//! is idempotent by slug: pairs already present in `user_attribute_ids` are
//! skipped, so re-running with the same input makes no remote calls.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info, instrument};

use velvet_rope_core::{ApplicationId, BenefitTitle, CompanyId};

use crate::db::sessions;
use crate::db::vip_configs::{self, AttributeRef, Benefit, GroupRef, VipConfig};
use crate::error::AppError;
use crate::platform::{AttributeDefinitionRequest, PlatformClient, UserGroupRequest};

/// A plan as submitted by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub title: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
}

/// One (application, plan) pair that still needs remote provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanTask {
    pub application_id: ApplicationId,
    pub title: BenefitTitle,
    pub description: Option<String>,
}

/// A failed remote call during provisioning.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionFailure {
    pub application_id: ApplicationId,
    pub plan: String,
    pub error: String,
}

/// Result of a provisioning run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub success: bool,
    /// (application, plan) pairs newly provisioned in this run.
    pub provisioned: Vec<ProvisionedPair>,
    pub failed: Vec<ProvisionFailure>,
}

/// A newly provisioned pair.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedPair {
    pub application_id: ApplicationId,
    pub plan: String,
}

/// Plan/attribute provisioning service.
pub struct PlanService {
    pool: PgPool,
    platform: PlatformClient,
}

impl PlanService {
    /// Create a new provisioning service.
    #[must_use]
    pub const fn new(pool: PgPool, platform: PlatformClient) -> Self {
        Self { pool, platform }
    }

    /// Provision the enabled plans on the selected applications.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if no plan is enabled or a title is
    /// invalid, `AppError::Database` if the session or config store fails.
    /// Individual remote failures do not fail the run; they are collected in
    /// the outcome's `failed` list.
    #[instrument(skip(self, plans), fields(company = %company_id, apps = application_ids.len()))]
    pub async fn configure_plans(
        &self,
        company_id: &CompanyId,
        application_ids: &[ApplicationId],
        plans: &[PlanRequest],
    ) -> Result<PlanOutcome, AppError> {
        if !plans.iter().any(|p| p.is_enabled) {
            return Err(AppError::BadRequest("no plans enabled".to_owned()));
        }
        if application_ids.is_empty() {
            return Err(AppError::BadRequest("no applications selected".to_owned()));
        }

        let session = sessions::latest_session(&self.pool).await?;

        let mut config = vip_configs::get(&self.pool, company_id)
            .await?
            .unwrap_or_else(|| VipConfig::empty(company_id.clone()));

        let tasks = plan_tasks(&config, application_ids, plans)?;

        let mut provisioned = Vec::new();
        let mut failed = Vec::new();

        for task in tasks {
            match self
                .provision_pair(&session.access_token, company_id, &task, &mut config)
                .await
            {
                Ok(()) => {
                    info!(
                        app = %task.application_id,
                        plan = %task.title,
                        "Provisioned plan"
                    );
                    provisioned.push(ProvisionedPair {
                        application_id: task.application_id,
                        plan: task.title.as_str().to_owned(),
                    });
                }
                Err(e) => {
                    error!(
                        app = %task.application_id,
                        plan = %task.title,
                        error = %e,
                        "Plan provisioning failed"
                    );
                    failed.push(ProvisionFailure {
                        application_id: task.application_id,
                        plan: task.title.as_str().to_owned(),
                        error: e.to_string(),
                    });
                }
            }
        }

        merge_catalog(&mut config, application_ids, plans);
        vip_configs::upsert(&self.pool, &config).await?;

        Ok(PlanOutcome {
            success: true,
            provisioned,
            failed,
        })
    }

    /// Create the attribute definition and user group for one pair, recording
    /// the resulting IDs into the in-memory config as each call succeeds. An
    /// attribute that was created before a failing group creation stays
    /// recorded, matching the no-rollback contract.
    async fn provision_pair(
        &self,
        token: &str,
        company_id: &CompanyId,
        task: &PlanTask,
        config: &mut VipConfig,
    ) -> Result<(), AppError> {
        let description = task
            .description
            .clone()
            .unwrap_or_else(|| format!("VIP benefit: {}", task.title.display_name()));

        let attribute_request = AttributeDefinitionRequest::boolean(
            task.title.display_name(),
            task.title.slug(),
            description.clone(),
        );
        let attribute_id = self
            .platform
            .create_attribute_definition(token, company_id, &task.application_id, &attribute_request)
            .await?;

        config
            .user_attribute_ids
            .entry(task.application_id.as_str().to_owned())
            .or_default()
            .push(AttributeRef {
                attribute_id: attribute_id.clone(),
                name: task.title.as_str().to_owned(),
            });

        let group_request = UserGroupRequest::equals_true(
            task.title.as_str().to_owned(),
            description,
            attribute_id.into_inner(),
        );
        let group_id = self
            .platform
            .create_user_group(token, company_id, &task.application_id, &group_request)
            .await?;

        config
            .user_group_ids
            .entry(task.application_id.as_str().to_owned())
            .or_default()
            .push(GroupRef {
                group_id,
                name: task.title.as_str().to_owned(),
            });

        Ok(())
    }
}

/// Compute which (application, plan) pairs still need remote provisioning.
///
/// Already-provisioned pairs are detected by slug against the config's
/// attribute map, making re-runs no-ops for them.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if an enabled plan has an empty title.
pub fn plan_tasks(
    config: &VipConfig,
    application_ids: &[ApplicationId],
    plans: &[PlanRequest],
) -> Result<Vec<PlanTask>, AppError> {
    let mut tasks = Vec::new();

    for application_id in application_ids {
        let existing = config.provisioned_slugs(application_id);

        for plan in plans.iter().filter(|p| p.is_enabled) {
            let title = BenefitTitle::parse(&plan.title)
                .map_err(|e| AppError::BadRequest(format!("invalid plan title: {e}")))?;

            if existing.contains(&title.slug()) {
                continue;
            }

            tasks.push(PlanTask {
                application_id: application_id.clone(),
                title,
                description: plan.description.clone(),
            });
        }
    }

    Ok(tasks)
}

/// Merge the benefit catalog and application set into the config.
///
/// The merge only adds: plans whose title is already cataloged are left
/// untouched, and application IDs are unioned.
fn merge_catalog(config: &mut VipConfig, application_ids: &[ApplicationId], plans: &[PlanRequest]) {
    for plan in plans {
        let known = config
            .benefits
            .iter()
            .any(|b| b.title.eq_ignore_ascii_case(&plan.title));
        if !known {
            config.benefits.push(Benefit {
                title: plan.title.clone(),
                is_enabled: plan.is_enabled,
                description: plan.description.clone(),
                img: plan.img.clone(),
            });
        }
    }

    for application_id in application_ids {
        if !config.application_ids.contains(application_id) {
            config.application_ids.push(application_id.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use velvet_rope_core::AttributeId;

    fn enabled_plan(title: &str) -> PlanRequest {
        PlanRequest {
            title: title.to_owned(),
            is_enabled: true,
            description: None,
            img: None,
        }
    }

    fn provisioned_config(app: &str, titles: &[&str]) -> VipConfig {
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
        config
    }

    #[test]
    fn test_plan_tasks_skips_provisioned_pairs() {
        let config = provisioned_config("A1", &["CUSTOM_PROMOTIONS"]);
        let apps = vec![ApplicationId::new("A1"), ApplicationId::new("A2")];
        let plans = vec![enabled_plan("CUSTOM_PROMOTIONS"), enabled_plan("EARLY_ACCESS")];

        let tasks = plan_tasks(&config, &apps, &plans).unwrap();

        // A1 already has CUSTOM_PROMOTIONS, so only 3 of the 4 pairs remain
        assert_eq!(tasks.len(), 3);
        assert!(!tasks.iter().any(|t| {
            t.application_id.as_str() == "A1" && t.title.as_str() == "CUSTOM_PROMOTIONS"
        }));
    }

    #[test]
    fn test_plan_tasks_second_run_is_noop() {
        let config = provisioned_config("A1", &["CUSTOM_PROMOTIONS", "EARLY_ACCESS"]);
        let apps = vec![ApplicationId::new("A1")];
        let plans = vec![enabled_plan("CUSTOM_PROMOTIONS"), enabled_plan("EARLY_ACCESS")];

        let tasks = plan_tasks(&config, &apps, &plans).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_plan_tasks_ignores_disabled_plans() {
        let config = VipConfig::empty(CompanyId::new("42"));
        let apps = vec![ApplicationId::new("A1")];
        let plans = vec![PlanRequest {
            title: "CUSTOM_PROMOTIONS".to_owned(),
            is_enabled: false,
            description: None,
            img: None,
        }];

        let tasks = plan_tasks(&config, &apps, &plans).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_merge_catalog_is_add_only() {
        let mut config = VipConfig::empty(CompanyId::new("42"));
        config.benefits.push(Benefit {
            title: "CUSTOM_PROMOTIONS".to_owned(),
            is_enabled: true,
            description: Some("original wording".to_owned()),
            img: None,
        });
        config.application_ids.push(ApplicationId::new("A1"));

        let mut updated = enabled_plan("CUSTOM_PROMOTIONS");
        updated.description = Some("new wording".to_owned());

        merge_catalog(
            &mut config,
            &[ApplicationId::new("A1"), ApplicationId::new("A2")],
            &[updated, enabled_plan("EARLY_ACCESS")],
        );

        // Existing benefit untouched, new one appended
        assert_eq!(config.benefits.len(), 2);
        assert_eq!(
            config.benefits[0].description.as_deref(),
            Some("original wording")
        );
        // Application set unioned without duplicates
        assert_eq!(config.application_ids.len(), 2);
    }
}
