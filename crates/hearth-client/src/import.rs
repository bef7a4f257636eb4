//! Statement import driver
//!
//! Runs an [`UploadFlow`] against the backend: uploads the file, asks for a
//! password when the statement is protected, retries with it, and reloads the
//! transaction list once the import is done. Failures are held in the error
//! state for the dismiss delay before the flow returns to idle.

use async_trait::async_trait;
use hearth_config::UploadConfig;
use hearth_core::{
    CoreError, DefaultErrorLogger, ErrorContext, ErrorLogger, Transaction, TransactionSource, UploadFlow,
    UploadRequest, UploadState,
};
use hearth_stream::UploadProgressEvent;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::cancel::Cancellation;
use crate::client::ApiClient;
use crate::error::ClientError;

/// What the password prompt is told
#[derive(Debug, Clone, Copy)]
pub struct PasswordRequest<'a> {
    pub file_name: &'a str,
    pub message: &'a str,
    /// Set after the server rejected `previous`
    pub invalid: bool,
    pub previous: Option<&'a str>,
}

/// Supplies passwords for protected statements
#[async_trait]
pub trait PasswordPrompt: Send {
    /// `None` abandons the import
    async fn request_password(&mut self, request: PasswordRequest<'_>) -> Option<Zeroizing<String>>;
}

/// How an import ended
#[derive(Debug)]
pub enum ImportReport {
    /// `transactions` is `None` when reloading the list failed
    Imported {
        created: u64,
        transactions: Option<Vec<Transaction>>,
    },
    /// The password prompt was dismissed
    Abandoned,
}

/// Drives one statement import at a time
pub struct StatementImport<S> {
    client: ApiClient,
    source: S,
    flow: UploadFlow,
    cancel: Cancellation,
    dismiss_delay: Duration,
    logger: DefaultErrorLogger,
}

impl<S> StatementImport<S>
where
    S: TransactionSource,
    ClientError: From<S::Error>,
{
    pub fn new(client: ApiClient, source: S, limits: &UploadConfig) -> Self {
        Self {
            client,
            source,
            flow: UploadFlow::new(limits.clone()),
            cancel: Cancellation::new(),
            dismiss_delay: limits.error_dismiss_delay(),
            logger: DefaultErrorLogger,
        }
    }

    pub fn with_dismiss_delay(mut self, delay: Duration) -> Self {
        self.dismiss_delay = delay;
        self
    }

    /// Handle that aborts the current or next run when fired
    ///
    /// A fired handle is spent once the run it aborted returns; ask again
    /// for a handle covering later runs.
    pub fn cancellation(&self) -> Cancellation {
        self.cancel.clone()
    }

    pub fn state(&self) -> &UploadState {
        self.flow.state()
    }

    /// Abort whatever is in flight and return to idle
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.flow.cancel();
        self.rearm();
    }

    fn rearm(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = Cancellation::new();
        }
    }

    /// Import `request`, prompting through `prompt` when a password is needed
    pub async fn run<P, F>(
        &mut self,
        request: UploadRequest,
        prompt: &mut P,
        on_progress: F,
    ) -> Result<ImportReport, ClientError>
    where
        P: PasswordPrompt + ?Sized,
        F: FnMut(&UploadProgressEvent),
    {
        let result = self.drive(request, prompt, on_progress).await;
        self.rearm();
        result
    }

    async fn drive<P, F>(
        &mut self,
        request: UploadRequest,
        prompt: &mut P,
        mut on_progress: F,
    ) -> Result<ImportReport, ClientError>
    where
        P: PasswordPrompt + ?Sized,
        F: FnMut(&UploadProgressEvent),
    {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let file_name = request.file.name.clone();
        let mut attempt = match self.flow.start(request) {
            Ok(attempt) => attempt.clone(),
            Err(err) => {
                self.logger.log_error(&err, &self.context("start_upload", &file_name));
                return Err(err.into());
            }
        };

        loop {
            let flow = &mut self.flow;
            let result = self
                .client
                .upload_statement(&attempt, &self.cancel, |event| {
                    flow.on_progress(event);
                    on_progress(event);
                })
                .await;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(ClientError::Cancelled) => {
                    self.flow.cancel();
                    return Err(ClientError::Cancelled);
                }
                Err(err) => return Err(self.fail(err, &file_name).await),
            };

            self.flow.on_outcome(&outcome)?;
            if matches!(self.flow.state(), UploadState::Done { .. }) {
                return self.complete().await;
            }
            match self.next_password_attempt(prompt, &file_name).await? {
                Some(next) => attempt = next,
                None => {
                    log::info!(target: "hearth::import", "password prompt dismissed for {}", file_name);
                    self.flow.cancel();
                    return Ok(ImportReport::Abandoned);
                }
            }
        }
    }

    fn context(&self, operation: &str, file_name: &str) -> ErrorContext {
        ErrorContext::new(operation).with_data("file", serde_json::json!(file_name))
    }

    /// Ask until a usable password is given or the prompt is dismissed
    async fn next_password_attempt<P>(&mut self, prompt: &mut P, file_name: &str) -> Result<Option<UploadRequest>, ClientError>
    where
        P: PasswordPrompt + ?Sized,
    {
        loop {
            let answer = {
                let state = self.flow.state();
                let UploadState::AwaitingPassword { invalid, message } = state else {
                    return Err(CoreError::InvalidTransition {
                        from: state.name().to_string(),
                        action: "ask for a password".to_string(),
                    }
                    .into());
                };
                let request = PasswordRequest {
                    file_name,
                    message,
                    invalid: *invalid,
                    previous: self.flow.password(),
                };
                prompt.request_password(request).await
            };
            let Some(password) = answer else {
                return Ok(None);
            };

            match self.flow.submit_password(password) {
                Ok(next) => return Ok(Some(next.clone())),
                Err(CoreError::EmptyPassword) => {
                    self.logger.log_warning("empty password ignored", &self.context("submit_password", file_name));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn complete(&mut self) -> Result<ImportReport, ClientError> {
        let transactions = match self.source.load_transactions().await {
            Ok(transactions) => Some(transactions),
            Err(err) => {
                let err = ClientError::from(err);
                self.logger.log_warning(
                    &format!("could not reload transactions: {}", err),
                    &ErrorContext::new("reload_transactions"),
                );
                None
            }
        };
        let created = self.flow.finish()?;
        Ok(ImportReport::Imported { created, transactions })
    }

    /// Hold the error state for the dismiss delay, then reset
    async fn fail(&mut self, err: ClientError, file_name: &str) -> ClientError {
        let context = self
            .context("upload_statement", file_name)
            .with_data("status", serde_json::json!(err.status()));
        self.logger.log_warning(&err.to_string(), &context);

        if let Err(flow_err) = self.flow.on_failure(err.to_string()) {
            return flow_err.into();
        }
        tokio::select! {
            _ = tokio::time::sleep(self.dismiss_delay) => {}
            _ = self.cancel.cancelled() => {}
        }
        if let Err(flow_err) = self.flow.dismiss_error() {
            return flow_err.into();
        }
        err
    }
}

impl<S> Drop for StatementImport<S> {
    fn drop(&mut self) {
        if matches!(
            self.flow.state(),
            UploadState::Uploading { .. } | UploadState::AwaitingPassword { .. }
        ) {
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionContext;
    use crate::test_support::{serve, transaction_json};
    use axum::extract::{Multipart, State};
    use axum::http::header;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use hearth_core::{StaticTransactions, UploadFile};
    use hearth_stream::StreamError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Protected statement whose password is `1234`
    fn protected_bank(uploads: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/api/upload/stream",
                post(|State(uploads): State<Arc<AtomicUsize>>, mut multipart: Multipart| async move {
                    uploads.fetch_add(1, Ordering::SeqCst);
                    let mut password = None;
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        if field.name() == Some("password") {
                            password = Some(field.text().await.unwrap());
                        }
                    }
                    let body = match password.as_deref() {
                        None => "data: {\"progress\":5,\"message\":\"Checking file\"}\ndata: {\"requiresPassword\":true,\"message\":\"PDF is protected\"}\n",
                        Some("1234") => "data: {\"progress\":60,\"message\":\"Importing\"}\ndata: {\"success\":true,\"transactionsCreated\":3}\n",
                        Some(_) => "data: {\"invalidPassword\":true,\"message\":\"Wrong password\"}\n",
                    };
                    ([(header::CONTENT_TYPE, "text/event-stream")], body)
                }),
            )
            .route(
                "/api/transactions",
                get(|| async {
                    Json(serde_json::json!({
                        "success": true,
                        "data": { "data": [transaction_json("t1", "Fatura", 10.0, None)], "total": 1, "page": 1, "limit": 50 }
                    }))
                }),
            )
            .with_state(uploads)
    }

    #[derive(Default)]
    struct ScriptedPrompt {
        answers: Vec<Option<&'static str>>,
        seen: Vec<(bool, Option<String>)>,
    }

    #[async_trait]
    impl PasswordPrompt for ScriptedPrompt {
        async fn request_password(&mut self, request: PasswordRequest<'_>) -> Option<Zeroizing<String>> {
            self.seen.push((request.invalid, request.previous.map(str::to_string)));
            let answer = self.answers.remove(0);
            answer.map(|a| Zeroizing::new(a.to_string()))
        }
    }

    fn statement() -> UploadRequest {
        UploadRequest::new(UploadFile::new("fatura.pdf", b"%PDF-1.4".to_vec()))
    }

    async fn importer(uploads: Arc<AtomicUsize>) -> StatementImport<ApiClient> {
        let client = ApiClient::new(serve(protected_bank(uploads)).await, SessionContext::new());
        StatementImport::new(client.clone(), client, &UploadConfig::default()).with_dismiss_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_password_retry_until_success() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let mut import = importer(uploads.clone()).await;
        let mut prompt = ScriptedPrompt {
            answers: vec![Some("0000"), Some("1234")],
            ..Default::default()
        };

        let mut messages = Vec::new();
        let report = import
            .run(statement(), &mut prompt, |e| messages.push(e.message.clone()))
            .await
            .unwrap();

        match report {
            ImportReport::Imported { created, transactions } => {
                assert_eq!(created, 3);
                assert_eq!(transactions.unwrap().len(), 1);
            }
            other => panic!("unexpected report {:?}", other),
        }
        assert_eq!(prompt.seen, vec![(false, None), (true, Some("0000".to_string()))]);
        assert_eq!(uploads.load(Ordering::SeqCst), 3);
        assert_eq!(messages, vec!["Checking file", "PDF is protected", "Wrong password", "Importing"]);
        assert_eq!(import.state(), &UploadState::Idle);
    }

    #[tokio::test]
    async fn test_empty_password_asks_again() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let mut import = importer(uploads.clone()).await;
        let mut prompt = ScriptedPrompt {
            answers: vec![Some("  "), Some("1234")],
            ..Default::default()
        };

        let report = import.run(statement(), &mut prompt, |_| {}).await.unwrap();
        assert!(matches!(report, ImportReport::Imported { created: 3, .. }));
        assert_eq!(prompt.seen, vec![(false, None), (false, None)]);
        assert_eq!(uploads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dismissed_prompt_abandons() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let mut import = importer(uploads.clone()).await;
        let mut prompt = ScriptedPrompt {
            answers: vec![None],
            ..Default::default()
        };

        let report = import.run(statement(), &mut prompt, |_| {}).await.unwrap();
        assert!(matches!(report, ImportReport::Abandoned));
        assert_eq!(import.state(), &UploadState::Idle);
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_file_makes_no_request() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let mut import = importer(uploads.clone()).await;

        let request = UploadRequest::new(UploadFile::new("notes.txt", vec![1, 2, 3]));
        let err = import.run(request, &mut ScriptedPrompt::default(), |_| {}).await.unwrap_err();

        assert!(matches!(err, ClientError::Core(CoreError::ValidationError { .. })));
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
        assert_eq!(import.state(), &UploadState::Idle);
    }

    #[tokio::test]
    async fn test_failure_resets_after_delay() {
        let router = Router::new().route(
            "/api/upload/stream",
            post(|| async { "data: {\"success\":false,\"error\":\"Unsupported bank\"}\n" }),
        );
        let client = ApiClient::new(serve(router).await, SessionContext::new());
        let mut import = StatementImport::new(client, StaticTransactions::default(), &UploadConfig::default())
            .with_dismiss_delay(Duration::from_millis(20));

        let err = import.run(statement(), &mut ScriptedPrompt::default(), |_| {}).await.unwrap_err();
        assert!(matches!(err, ClientError::Stream(StreamError::Failed { .. })));
        assert_eq!(err.to_string(), "Unsupported bank");
        assert_eq!(import.state(), &UploadState::Idle);
    }

    #[tokio::test]
    async fn test_fired_handle_aborts_only_the_next_run() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let mut import = importer(uploads.clone()).await;
        let handle = import.cancellation();
        handle.cancel();

        let err = import.run(statement(), &mut ScriptedPrompt::default(), |_| {}).await.unwrap_err();
        assert!(matches!(err, ClientError::Cancelled));
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
        assert!(!import.cancellation().is_cancelled());

        let mut prompt = ScriptedPrompt {
            answers: vec![Some("1234")],
            ..Default::default()
        };
        let report = import.run(statement(), &mut prompt, |_| {}).await.unwrap();
        assert!(matches!(report, ImportReport::Imported { created: 3, .. }));
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_new_import_after_cancel() {
        let uploads = Arc::new(AtomicUsize::new(0));
        let mut import = importer(uploads.clone()).await;
        import.cancel();
        assert_eq!(import.state(), &UploadState::Idle);

        let mut prompt = ScriptedPrompt {
            answers: vec![Some("1234")],
            ..Default::default()
        };
        let report = import.run(statement(), &mut prompt, |_| {}).await.unwrap();
        assert!(matches!(report, ImportReport::Imported { created: 3, .. }));
        assert_eq!(uploads.load(Ordering::SeqCst), 2);
        assert_eq!(import.state(), &UploadState::Idle);
    }
}
