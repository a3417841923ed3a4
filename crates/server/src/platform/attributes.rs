//! User attribute definition and user group operations.

use tracing::instrument;

use velvet_rope_core::{ApplicationId, AttributeId, CompanyId, GroupId, MemberId};

use super::{
    AttributeDefinitionRequest, CreatedAttributeDefinition, CreatedUserGroup, PlatformClient,
    PlatformError, SetUserAttributeRequest, UpdatedUserAttribute, UserGroupRequest,
};

impl PlatformClient {
    /// Create a boolean user-attribute definition scoped to an application.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token, request), fields(slug = %request.slug))]
    pub async fn create_attribute_definition(
        &self,
        token: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        request: &AttributeDefinitionRequest,
    ) -> Result<AttributeId, PlatformError> {
        let path = format!(
            "/service/platform/user/v1.0/company/{company_id}/application/{application_id}/user_attribute/definition"
        );
        let created: CreatedAttributeDefinition = self.post(token, &path, request).await?;
        Ok(AttributeId::new(created.id))
    }

    /// Create a conditional user group scoped to an application.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token, request), fields(group = %request.name))]
    pub async fn create_user_group(
        &self,
        token: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        request: &UserGroupRequest,
    ) -> Result<GroupId, PlatformError> {
        let path = format!(
            "/service/platform/user/v1.0/company/{company_id}/application/{application_id}/user_group"
        );
        let created: CreatedUserGroup = self.post(token, &path, request).await?;
        Ok(created.uid)
    }

    /// Set a user's boolean attribute to true on an application.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self, token), fields(attribute = %attribute_id, user = %user_id))]
    pub async fn set_user_attribute_true(
        &self,
        token: &str,
        company_id: &CompanyId,
        application_id: &ApplicationId,
        attribute_id: &AttributeId,
        user_id: &MemberId,
    ) -> Result<(), PlatformError> {
        let path = format!(
            "/service/platform/user/v1.0/company/{company_id}/application/{application_id}/user_attribute/definition/{attribute_id}/user/{user_id}"
        );
        let _: UpdatedUserAttribute = self
            .put(token, &path, &SetUserAttributeRequest::boolean_true())
            .await?;
        Ok(())
    }
}
