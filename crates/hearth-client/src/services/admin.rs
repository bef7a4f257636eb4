use hearth_core::reports::UpdateFeatureFlag;
use hearth_core::{AuditLogPage, AuditLogQuery, PermissionsOverview};

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct AdminService<'a> {
    pub(crate) client: &'a ApiClient,
}

impl AdminService<'_> {
    pub async fn permissions(&self) -> Result<PermissionsOverview, ClientError> {
        self.client.get("/admin/permissions").await
    }

    pub async fn update_feature_flag(&self, key: &str, data: &UpdateFeatureFlag) -> Result<(), ClientError> {
        self.client.patch_unit(&format!("/admin/feature-flags/{}", key), data).await
    }

    pub async fn audit_logs(&self, query: &AuditLogQuery) -> Result<AuditLogPage, ClientError> {
        self.client.get_with_query("/admin/audit-logs", &query.to_pairs()).await
    }
}
