//! Cart promotion operations.

use tracing::instrument;

use velvet_rope_core::{ApplicationId, CompanyId, PromotionId};

use super::{CreatedPromotion, PlatformClient, PlatformError, PromotionPayload};

impl PlatformClient {
    /// Create a cart promotion scoped to an application.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token, payload), fields(promotion = %payload.name))]
    pub async fn create_promotion(
        &self,
        token: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        payload: &PromotionPayload,
    ) -> Result<PromotionId, PlatformError> {
        let path = format!(
            "/service/platform/cart/v1.0/company/{company_id}/application/{application_id}/promotion"
        );
        let created: CreatedPromotion = self.post(token, &path, payload).await?;
        Ok(PromotionId::new(created.id))
    }
}
