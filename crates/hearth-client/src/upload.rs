//! Streamed statement upload (`POST /upload/stream`)

use hearth_core::UploadRequest;
use hearth_stream::{SseDecoder, StreamOutcome, UploadProgressEvent};
use reqwest::multipart::{Form, Part};

use crate::cancel::Cancellation;
use crate::client::ApiClient;
use crate::error::ClientError;

/// Message used when a rejected upload carries no `error` text
pub const DEFAULT_UPLOAD_ERROR: &str = "Failed to upload file";

fn build_form(request: &UploadRequest) -> Result<Form, ClientError> {
    let mut part = Part::bytes(request.file.bytes.clone()).file_name(request.file.name.clone());
    if let Some(ref content_type) = request.file.content_type {
        part = part.mime_str(content_type)?;
    }

    let mut form = Form::new().part("file", part);
    if let Some(password) = request.password() {
        form = form.text("password", password.to_string());
    }
    if let Some(month) = request.reference_month {
        form = form.text("referenceMonth", month.to_string());
    }
    if let Some(ref card_id) = request.card_id {
        form = form.text("cardId", card_id.clone());
    }
    Ok(form)
}

impl ApiClient {
    /// Upload a statement and follow its processing stream
    ///
    /// `on_progress` sees every frame carrying `progress` or `message`.
    /// Password prompts come back as `Ok` outcomes; firing `cancel` stops
    /// reading and drops the response.
    pub async fn upload_statement<F>(
        &self,
        request: &UploadRequest,
        cancel: &Cancellation,
        mut on_progress: F,
    ) -> Result<StreamOutcome, ClientError>
    where
        F: FnMut(&UploadProgressEvent),
    {
        if cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        log::info!(
            target: "hearth::upload",
            "uploading {} ({} bytes, password: {}, month: {:?}, card: {:?})",
            request.file.name,
            request.file.size(),
            request.password().is_some(),
            request.reference_month.map(|m| m.to_string()),
            request.card_id
        );

        let form = build_form(request)?;
        let builder = self.authorize(self.http().post(self.url("/upload/stream"))).multipart(form);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = builder.send() => response?,
        };
        let mut response = self.check_status(response, DEFAULT_UPLOAD_ERROR).await?;

        let mut decoder = SseDecoder::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::info!(target: "hearth::upload", "upload cancelled after {} frames", decoder.frames());
                    return Err(ClientError::Cancelled);
                }
                chunk = response.chunk() => chunk?,
            };
            match chunk {
                Some(bytes) => decoder.push(&bytes, &mut on_progress),
                None => break,
            }
        }

        let outcome = decoder.finish(&mut on_progress)?;
        log::debug!(target: "hearth::upload", "upload finished: {:?}", outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionContext};
    use crate::test_support::{serve, user};
    use axum::extract::{Multipart, State};
    use axum::http::{header, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use hearth_core::{ReferenceMonth, UploadFile};
    use hearth_stream::StreamError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use zeroize::Zeroizing;

    type Seen = Arc<Mutex<Vec<(String, String)>>>;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            base,
            SessionContext::with_session(Session {
                token: "tok".to_string(),
                user: user(),
            }),
        )
    }

    fn request() -> UploadRequest {
        UploadRequest::new(UploadFile::new("fatura.csv", b"date,amount\n".to_vec()))
    }

    /// Records multipart fields and answers with `body`
    fn recording_server(seen: Seen, body: &'static str) -> Router {
        Router::new()
            .route(
                "/api/upload/stream",
                post(move |State(seen): State<Seen>, mut multipart: Multipart| async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let value = match file_name {
                            Some(file_name) => file_name,
                            None => field.text().await.unwrap(),
                        };
                        seen.lock().unwrap().push((name, value));
                    }
                    ([(header::CONTENT_TYPE, "text/event-stream")], body)
                }),
            )
            .with_state(seen)
    }

    #[tokio::test]
    async fn test_successful_import_reports_progress() {
        let seen = Seen::default();
        let body = "data: {\"progress\":10,\"message\":\"Reading file\"}\n\n\
                    data: {\"progress\":100,\"message\":\"Done\",\"success\":true,\"transactionsCreated\":7,\"filename\":\"f.csv\"}\n\n";
        let base = serve(recording_server(seen.clone(), body)).await;

        let mut events = Vec::new();
        let outcome = client(&base)
            .upload_statement(&request(), &Cancellation::new(), |e| events.push(e.progress))
            .await
            .unwrap();

        assert_eq!(outcome.transactions_created(), Some(7));
        assert_eq!(events, vec![10.0, 100.0]);
        let fields = seen.lock().unwrap().clone();
        assert_eq!(fields, vec![("file".to_string(), "fatura.csv".to_string())]);
    }

    #[tokio::test]
    async fn test_optional_fields_are_sent() {
        let seen = Seen::default();
        let base = serve(recording_server(seen.clone(), "data: {\"success\":true}\n")).await;

        let request = request()
            .with_password(Zeroizing::new("1234".to_string()))
            .with_reference_month(ReferenceMonth::new(2024, 3).unwrap())
            .with_card("card-9");
        client(&base).upload_statement(&request, &Cancellation::new(), |_| {}).await.unwrap();

        let fields = seen.lock().unwrap().clone();
        assert_eq!(
            fields,
            vec![
                ("file".to_string(), "fatura.csv".to_string()),
                ("password".to_string(), "1234".to_string()),
                ("referenceMonth".to_string(), "2024-03".to_string()),
                ("cardId".to_string(), "card-9".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_password_is_omitted() {
        let seen = Seen::default();
        let base = serve(recording_server(seen.clone(), "data: {\"requiresPassword\":true}\n")).await;

        let request = request().with_password(Zeroizing::new(String::new()));
        let outcome = client(&base).upload_statement(&request, &Cancellation::new(), |_| {}).await.unwrap();

        assert!(outcome.requires_password());
        assert!(seen.lock().unwrap().iter().all(|(name, _)| name != "password"));
    }

    #[tokio::test]
    async fn test_stream_without_final_frame_fails() {
        let seen = Seen::default();
        let base = serve(recording_server(seen, "data: {\"progress\":50,\"message\":\"Halfway\"}\n")).await;

        let err = client(&base).upload_statement(&request(), &Cancellation::new(), |_| {}).await.unwrap_err();
        assert!(matches!(err, ClientError::Stream(StreamError::Incomplete)));
    }

    #[tokio::test]
    async fn test_rejected_upload_uses_body_error() {
        let router = Router::new().route(
            "/api/upload/stream",
            post(|| async { (StatusCode::PAYLOAD_TOO_LARGE, Json(serde_json::json!({ "error": "File too large" }))) }),
        );
        let base = serve(router).await;

        let err = client(&base).upload_statement(&request(), &Cancellation::new(), |_| {}).await.unwrap_err();
        assert_eq!(err.status(), Some(413));
        assert_eq!(err.to_string(), "File too large");
    }

    #[tokio::test]
    async fn test_unauthorized_upload_clears_session() {
        let router = Router::new().route("/api/upload/stream", post(|| async { StatusCode::UNAUTHORIZED }));
        let base = serve(router).await;
        let client = client(&base);

        let err = client.upload_statement(&request(), &Cancellation::new(), |_| {}).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert!(!client.session().is_active());
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_request() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let err = client("http://127.0.0.1:9/api")
            .upload_statement(&request(), &cancel, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_stops_reading_open_stream() {
        // Sends one frame, then keeps the connection open without finishing
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            let frame = "data: {\"progress\":5,\"message\":\"Queued\"}\n";
            let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n";
            let chunk = format!("{:x}\r\n{}\r\n", frame.len(), frame);
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(chunk.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let cancel = Cancellation::new();
        let trigger = cancel.clone();
        let client = client(&format!("http://{}/api", addr));
        let request = request();
        let upload = client.upload_statement(&request, &cancel, move |event| {
            assert_eq!(event.message, "Queued");
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), upload).await.unwrap().unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
    }
}
