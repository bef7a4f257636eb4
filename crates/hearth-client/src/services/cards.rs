use hearth_core::{Card, CardInput, CardStats};

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct CardService<'a> {
    pub(crate) client: &'a ApiClient,
}

impl CardService<'_> {
    pub async fn list(&self) -> Result<Vec<Card>, ClientError> {
        self.client.get("/cards").await
    }

    pub async fn stats(&self) -> Result<Vec<CardStats>, ClientError> {
        self.client.get("/cards/stats").await
    }

    pub async fn create(&self, data: &CardInput) -> Result<Card, ClientError> {
        self.client.post("/cards", data).await
    }

    pub async fn update(&self, id: &str, data: &CardInput) -> Result<Card, ClientError> {
        self.client.put(&format!("/cards/{}", id), data).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&format!("/cards/{}", id)).await
    }
}
