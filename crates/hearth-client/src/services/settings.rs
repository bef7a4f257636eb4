use hearth_core::reports::{ChangePassword, UpdateProfile};
use hearth_core::UserSettings;

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct SettingsService<'a> {
    pub(crate) client: &'a ApiClient,
}

impl SettingsService<'_> {
    pub async fn me(&self) -> Result<UserSettings, ClientError> {
        self.client.get("/settings/me").await
    }

    pub async fn update_profile(&self, data: &UpdateProfile) -> Result<(), ClientError> {
        self.client.put_unit("/settings/me", data).await
    }

    pub async fn change_password(&self, data: &ChangePassword) -> Result<(), ClientError> {
        self.client.patch_unit("/settings/password", data).await
    }
}
