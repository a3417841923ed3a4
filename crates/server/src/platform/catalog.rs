//! Catalog and configuration reads backing the admin surface.

use tracing::instrument;

use velvet_rope_core::{ApplicationId, CompanyId};

use super::{Application, ApplicationPage, PlatformClient, PlatformError, ProductPage};

impl PlatformClient {
    /// Fetch a page of the company's catalog products.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_products(
        &self,
        token: &str,
        company_id: &CompanyId,
        page_no: u32,
        page_size: u32,
    ) -> Result<ProductPage, PlatformError> {
        let path = format!(
            "/service/platform/catalog/v1.0/company/{company_id}/products?page_no={page_no}&page_size={page_size}"
        );
        self.get(token, &path).await
    }

    /// Fetch the company's sales channels.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn get_applications(
        &self,
        token: &str,
        company_id: &CompanyId,
    ) -> Result<ApplicationPage, PlatformError> {
        let path = format!(
            "/service/platform/configuration/v1.0/company/{company_id}/application"
        );
        self.get(token, &path).await
    }

    /// Fetch one sales channel by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the application is not found or the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_application(
        &self,
        token: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
    ) -> Result<Application, PlatformError> {
        let path = format!(
            "/service/platform/configuration/v1.0/company/{company_id}/application/{application_id}"
        );
        self.get(token, &path).await
    }
}
