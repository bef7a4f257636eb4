//! Login and registration

use hearth_core::{User, UserRole};
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::session::Session;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of `POST /auth/register`
#[derive(Clone, Serialize)]
pub struct RegisterData {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

pub struct AuthService<'a> {
    pub(crate) client: &'a ApiClient,
}

impl AuthService<'_> {
    /// Log in and make the new session current
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let session: Session = self
            .client
            .post("/auth/login", &Credentials { email, password })
            .await?;
        self.client.session().set(session.clone());
        log::info!(target: "hearth::auth", "logged in as {}", session.user.email);
        Ok(session)
    }

    pub async fn register(&self, data: &RegisterData) -> Result<User, ClientError> {
        self.client.post("/auth/register", data).await
    }

    /// Forget the current session
    pub fn logout(&self) -> Option<Session> {
        let session = self.client.session().clear();
        if let Some(ref s) = session {
            log::info!(target: "hearth::auth", "logged out {}", s.user.email);
        }
        session
    }
}
