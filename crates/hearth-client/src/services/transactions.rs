//! Transactions and installment generation

use async_trait::async_trait;
use hearth_core::{
    CoreError, CreateTransaction, GeneratedInstallments, Transaction, TransactionList, TransactionSource,
    UpdateTransaction,
};

use crate::client::ApiClient;
use crate::error::ClientError;

pub struct TransactionService<'a> {
    pub(crate) client: &'a ApiClient,
}

impl TransactionService<'_> {
    pub async fn list(&self) -> Result<TransactionList, ClientError> {
        self.client.get("/transactions").await
    }

    /// Look a transaction up in the current list
    pub async fn find(&self, id: &str) -> Result<Transaction, ClientError> {
        let list = self.list().await?;
        list.data
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound { id: id.to_string() }.into())
    }

    pub async fn create(&self, data: &CreateTransaction) -> Result<Transaction, ClientError> {
        self.client.post("/transactions", data).await
    }

    pub async fn update(&self, id: &str, data: &UpdateTransaction) -> Result<Transaction, ClientError> {
        self.client.patch(&format!("/transactions/{}", id), data).await
    }

    /// Move a transaction to someone else
    pub async fn redirect(&self, id: &str, redirect_type: &str, redirect_to: &str) -> Result<Transaction, ClientError> {
        self.update(id, &UpdateTransaction::redirect(redirect_type, redirect_to)).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client.delete(&format!("/transactions/{}", id)).await
    }

    /// Ask the backend to create the remaining installments of `id`
    pub async fn generate_installments(&self, id: &str) -> Result<GeneratedInstallments, ClientError> {
        let generated: GeneratedInstallments = self
            .client
            .post_empty(&format!("/transactions/{}/generate-installments", id))
            .await?;
        log::info!(target: "hearth::installments", "generated {} installments for {}", generated.created, id);
        Ok(generated)
    }
}

#[async_trait]
impl TransactionSource for ApiClient {
    type Error = ClientError;

    async fn load_transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        Ok(self.transactions().list().await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::test_support::{serve, transaction_json};
    use axum::extract::Path;
    use axum::routing::{get, patch, post};
    use axum::{Json, Router};
    use hearth_core::{TransactionCategory, TransactionType};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    fn list_body() -> Value {
        json!({
            "success": true,
            "data": {
                "data": [
                    transaction_json("t1", "Geladeira (2/4)", 250.0, Some("2/4")),
                    transaction_json("t2", "Mercado", 80.5, Some("Única"))
                ],
                "total": 2,
                "page": 1,
                "limit": 50
            }
        })
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/api/transactions",
                get(|| async { Json(list_body()) }).post(|Json(body): Json<Value>| async move {
                    let mut created = transaction_json("t3", body["description"].as_str().unwrap_or(""), 0.0, None);
                    created["amount"] = body["amount"].clone();
                    Json(json!({ "success": true, "data": created }))
                }),
            )
            .route(
                "/api/transactions/:id",
                patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    let mut updated = transaction_json(&id, "Mercado", 80.5, None);
                    updated["redirectType"] = body["redirectType"].clone();
                    updated["redirectTo"] = body["redirectTo"].clone();
                    Json(json!({ "success": true, "data": updated }))
                })
                .delete(|| async { Json(json!({ "success": true })) }),
            )
            .route(
                "/api/transactions/:id/generate-installments",
                post(|| async { Json(json!({ "success": true, "data": { "created": 2, "message": "2 installments created" } })) }),
            )
    }

    #[tokio::test]
    async fn test_list_and_find() {
        let client = ApiClient::new(serve(router()).await, SessionContext::new());

        let list = client.transactions().list().await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.data[1].amount, Decimal::new(805, 1));

        let found = client.transactions().find("t1").await.unwrap();
        assert_eq!(found.installment.as_deref(), Some("2/4"));

        let err = client.transactions().find("nope").await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::TransactionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_create_sends_amount_as_number() {
        let client = ApiClient::new(serve(router()).await, SessionContext::new());
        let data = CreateTransaction {
            kind: TransactionType::Expense,
            category: TransactionCategory::Food,
            amount: Decimal::new(1250, 2),
            description: Some("Padaria".to_string()),
            date: None,
            purchase_date: None,
            installment: None,
            card_id: None,
        };

        let created = client.transactions().create(&data).await.unwrap();
        assert_eq!(created.description.as_deref(), Some("Padaria"));
        assert_eq!(created.amount, Decimal::new(125, 1));
    }

    #[tokio::test]
    async fn test_redirect_and_delete() {
        let client = ApiClient::new(serve(router()).await, SessionContext::new());

        let updated = client.transactions().redirect("t2", "PARTNER", "Bruno").await.unwrap();
        assert!(updated.is_redirected());
        assert_eq!(updated.redirect_to.as_deref(), Some("Bruno"));

        client.transactions().delete("t2").await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_installments() {
        let client = ApiClient::new(serve(router()).await, SessionContext::new());
        let generated = client.transactions().generate_installments("t1").await.unwrap();
        assert_eq!(generated.created, 2);
        assert_eq!(generated.message, "2 installments created");
    }

    #[tokio::test]
    async fn test_client_is_a_transaction_source() {
        let client = ApiClient::new(serve(router()).await, SessionContext::new());
        let gaps = hearth_core::find_installment_gaps(&client).await.unwrap();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].id, "t1");
    }
}
