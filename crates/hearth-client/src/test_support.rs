//! In-process mock backend for client tests

use axum::Router;
use hearth_core::{User, UserRole};

/// Serve `router` on an ephemeral port and return its `/api` base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

pub fn user() -> User {
    User {
        id: "u1".to_string(),
        email: "ana@example.com".to_string(),
        name: "Ana".to_string(),
        role: UserRole::User,
    }
}

pub fn transaction_json(id: &str, description: &str, amount: f64, installment: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "type": "EXPENSE",
        "category": "SHOPPING",
        "amount": amount,
        "description": description,
        "date": "2024-05-10T00:00:00.000Z",
        "installment": installment
    })
}
