//! JSON API client
//!
//! Every endpoint answers with an [`ApiResponse`] envelope. Non-2xx answers
//! and envelopes with `success: false` become [`ClientError::Api`]; a 401
//! clears the shared session before returning [`ClientError::Unauthorized`].

use hearth_config::Config;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, DEFAULT_REQUEST_ERROR, SESSION_EXPIRED};
use crate::session::SessionContext;

/// Envelope wrapped around every JSON answer
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Payload of a successful envelope
    pub fn into_data(self, status: u16) -> Result<Option<T>, ClientError> {
        if !self.success {
            return Err(ClientError::Api {
                status,
                message: self.error.unwrap_or_else(|| DEFAULT_REQUEST_ERROR.to_string()),
            });
        }
        Ok(self.data)
    }
}

/// Body of an error answer; only `error` matters
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the hearth backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
    session: SessionContext,
}

impl ApiClient {
    /// `base_url` must already include the `/api` prefix
    pub fn new(base_url: impl Into<String>, session: SessionContext) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
            session,
        }
    }

    /// Client for the configured backend, honouring `HEARTH_API_URL`
    pub fn from_config(config: &Config, session: SessionContext) -> Self {
        let mut client = Self::new(config.api_url(), session);
        client.timeout = config.request_timeout();
        log::debug!(target: "hearth::client", "using API at {}", client.base_url);
        client
    }

    /// Timeout for JSON requests; uploads stream without one
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn error statuses into errors, clearing the session on 401
    pub(crate) async fn check_status(&self, response: Response, fallback: &str) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: ErrorBody = response.json().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            if self.session.clear().is_some() {
                log::warn!(target: "hearth::client", "session rejected by the server, logged out");
            }
            return Err(ClientError::Unauthorized {
                message: body.error.unwrap_or_else(|| SESSION_EXPIRED.to_string()),
            });
        }

        log::debug!(target: "hearth::client", "request failed with status {}", status);
        Err(ClientError::Api {
            status: status.as_u16(),
            message: body.error.unwrap_or_else(|| fallback.to_string()),
        })
    }

    async fn dispatch<T, B>(&self, method: Method, path: &str, query: &[(&str, String)], body: Option<&B>) -> Result<Option<T>, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        log::debug!(target: "hearth::client", "{} {}", method, path);

        let mut builder = self.authorize(self.http.request(method, self.url(path)));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let response = self.check_status(response, DEFAULT_REQUEST_ERROR).await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(None);
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        envelope.into_data(status)
    }

    fn required<T>(data: Option<T>, path: &str) -> Result<T, ClientError> {
        data.ok_or_else(|| ClientError::Decode(format!("no data in response to {}", path)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let data = self.dispatch::<T, ()>(Method::GET, path, &[], None).await?;
        Self::required(data, path)
    }

    pub async fn get_with_query<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ClientError> {
        let data = self.dispatch::<T, ()>(Method::GET, path, query, None).await?;
        Self::required(data, path)
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let data = self.dispatch(Method::POST, path, &[], Some(body)).await?;
        Self::required(data, path)
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let data = self.dispatch::<T, ()>(Method::POST, path, &[], None).await?;
        Self::required(data, path)
    }

    /// POST whose answer carries no data
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.dispatch::<serde_json::Value, B>(Method::POST, path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let data = self.dispatch(Method::PUT, path, &[], Some(body)).await?;
        Self::required(data, path)
    }

    /// PUT whose answer carries no data
    pub async fn put_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.dispatch::<serde_json::Value, B>(Method::PUT, path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let data = self.dispatch(Method::PATCH, path, &[], Some(body)).await?;
        Self::required(data, path)
    }

    /// PATCH whose answer carries no data
    pub async fn patch_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        self.dispatch::<serde_json::Value, B>(Method::PATCH, path, &[], Some(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.dispatch::<serde_json::Value, ()>(Method::DELETE, path, &[], None).await?;
        Ok(())
    }
}
