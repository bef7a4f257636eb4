//! Shared account with a partner

use hearth_core::{CoupleData, CoupleInput};

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct CoupleService<'a> {
    pub(crate) client: &'a ApiClient,
}

impl CoupleService<'_> {
    /// Current shared account; `None` when the backend answers 404
    pub async fn get(&self) -> Result<Option<CoupleData>, ClientError> {
        match self.client.get::<CoupleData>("/couple").await {
            Ok(couple) => Ok(Some(couple)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create(&self, data: &CoupleInput) -> Result<(), ClientError> {
        self.client.post_unit("/couple", data).await
    }

    pub async fn update(&self, data: &CoupleInput) -> Result<(), ClientError> {
        self.client.patch_unit("/couple", data).await
    }

    pub async fn delete(&self) -> Result<(), ClientError> {
        self.client.delete("/couple").await
    }
}
