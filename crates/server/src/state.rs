//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use velvet_rope_core::CompanyId;

use crate::config::ServerConfig;
use crate::db::vip_configs::{self, VipConfig};
use crate::db::RepositoryError;
use crate::platform::{PlatformClient, PlatformError};

/// How long a cached VIP configuration stays fresh.
const CONFIG_CACHE_TTL: Duration = Duration::from_secs(60);

/// How many company configurations to keep cached.
const CONFIG_CACHE_CAPACITY: u64 = 1_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources: the database pool, the platform API client, and a short-lived
/// per-company configuration cache for the webhook hot path.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    platform: PlatformClient,
    vip_configs: Cache<String, Arc<VipConfig>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform HTTP client fails to build.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, PlatformError> {
        let platform = PlatformClient::new(&config.platform)?;
        let vip_configs = Cache::builder()
            .max_capacity(CONFIG_CACHE_CAPACITY)
            .time_to_live(CONFIG_CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                platform,
                vip_configs,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the platform API client.
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.inner.platform
    }

    /// Fetch a company's VIP configuration, through the cache.
    ///
    /// Negative results are not cached: a company configuring itself for the
    /// first time becomes visible on the next webhook.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database read fails.
    pub async fn vip_config(
        &self,
        company_id: &CompanyId,
    ) -> Result<Option<Arc<VipConfig>>, RepositoryError> {
        if let Some(hit) = self.inner.vip_configs.get(company_id.as_str()).await {
            return Ok(Some(hit));
        }

        match vip_configs::get(&self.inner.pool, company_id).await? {
            Some(config) => {
                let config = Arc::new(config);
                self.inner
                    .vip_configs
                    .insert(company_id.as_str().to_owned(), Arc::clone(&config))
                    .await;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    /// Drop a company's cached configuration after a write.
    pub async fn invalidate_vip_config(&self, company_id: &CompanyId) {
        self.inner
            .vip_configs
            .invalidate(&company_id.as_str().to_owned())
            .await;
    }
}
