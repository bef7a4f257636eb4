//! Statement upload flow
//!
//! ```text
//! Idle -> Uploading -> AwaitingPassword -> Uploading (with password) -> Done | Error
//! ```
//!
//! The flow only tracks state; the caller performs the request returned by
//! [`UploadFlow::start`] or [`UploadFlow::submit_password`] and reports back
//! through [`UploadFlow::on_outcome`] or [`UploadFlow::on_failure`].

use hearth_config::UploadConfig;
use hearth_stream::{StreamOutcome, UploadProgressEvent};
use zeroize::Zeroizing;

use crate::error::CoreError;
use crate::upload::{validate_upload, UploadRequest};

/// Where an upload currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    /// No upload in progress
    Idle,
    /// A request is streaming
    Uploading {
        with_password: bool,
        progress: f64,
        message: String,
    },
    /// The file is protected; `invalid` is set after a rejected password
    AwaitingPassword { invalid: bool, message: String },
    /// Import finished
    Done { created: u64 },
    /// Import failed; reset after the error was shown
    Error { message: String },
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            UploadState::Idle => "idle",
            UploadState::Uploading { .. } => "uploading",
            UploadState::AwaitingPassword { .. } => "awaiting a password",
            UploadState::Done { .. } => "done",
            UploadState::Error { .. } => "showing an error",
        }
    }

    /// Whether a new upload may start from here
    pub fn is_settled(&self) -> bool {
        matches!(self, UploadState::Idle | UploadState::Done { .. } | UploadState::Error { .. })
    }
}

/// State machine for one statement import
#[derive(Debug)]
pub struct UploadFlow {
    limits: UploadConfig,
    state: UploadState,
    request: Option<UploadRequest>,
}

impl UploadFlow {
    pub fn new(limits: UploadConfig) -> Self {
        Self {
            limits,
            state: UploadState::Idle,
            request: None,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Request of the current attempt
    pub fn request(&self) -> Option<&UploadRequest> {
        self.request.as_ref()
    }

    /// Password kept from the last attempt, for correction
    pub fn password(&self) -> Option<&str> {
        self.request.as_ref().and_then(|r| r.password())
    }

    fn invalid(&self, action: &str) -> CoreError {
        CoreError::InvalidTransition {
            from: self.state.name().to_string(),
            action: action.to_string(),
        }
    }

    /// Validate the file and begin the first attempt
    ///
    /// Nothing changes when validation fails.
    pub fn start(&mut self, request: UploadRequest) -> Result<&UploadRequest, CoreError> {
        if !self.state.is_settled() {
            return Err(self.invalid("start another upload"));
        }
        validate_upload(&request.file, &self.limits)?;

        let mut request = request;
        request.password = None;
        log::info!(
            target: "hearth::flow",
            "starting upload of {} ({} bytes)",
            request.file.name,
            request.file.size()
        );

        self.state = UploadState::Uploading {
            with_password: false,
            progress: 0.0,
            message: "Starting upload...".to_string(),
        };
        Ok(self.request.insert(request))
    }

    /// Record a progress event; ignored unless uploading
    pub fn on_progress(&mut self, event: &UploadProgressEvent) {
        if let UploadState::Uploading { progress, message, .. } = &mut self.state {
            *progress = event.progress;
            *message = event.message.clone();
        }
    }

    /// Apply the resolved outcome of the current attempt
    pub fn on_outcome(&mut self, outcome: &StreamOutcome) -> Result<(), CoreError> {
        if !matches!(self.state, UploadState::Uploading { .. }) {
            return Err(self.invalid("record an upload outcome"));
        }

        self.state = match outcome {
            StreamOutcome::NeedsPassword { message } => {
                log::info!(target: "hearth::flow", "file is password protected");
                UploadState::AwaitingPassword {
                    invalid: false,
                    message: message.clone(),
                }
            }
            StreamOutcome::InvalidPassword { message } => {
                log::info!(target: "hearth::flow", "password rejected");
                UploadState::AwaitingPassword {
                    invalid: true,
                    message: message.clone(),
                }
            }
            StreamOutcome::Completed(summary) => {
                log::info!(
                    target: "hearth::flow",
                    "import finished, {} transactions created",
                    summary.transactions_created
                );
                UploadState::Done {
                    created: summary.transactions_created,
                }
            }
        };
        Ok(())
    }

    /// Record a transport or processing failure of the current attempt
    pub fn on_failure(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        if !matches!(self.state, UploadState::Uploading { .. }) {
            return Err(self.invalid("record an upload failure"));
        }
        let message = message.into();
        log::warn!(target: "hearth::flow", "upload failed: {}", message);
        self.state = UploadState::Error { message };
        Ok(())
    }

    /// Retry the same file, month and card with a password
    pub fn submit_password(&mut self, password: Zeroizing<String>) -> Result<&UploadRequest, CoreError> {
        if !matches!(self.state, UploadState::AwaitingPassword { .. }) {
            return Err(self.invalid("submit a password"));
        }
        if password.trim().is_empty() {
            return Err(CoreError::EmptyPassword);
        }
        // only `state` is read here, `request` stays borrowed for the return
        let Some(request) = self.request.as_mut() else {
            return Err(CoreError::InvalidTransition {
                from: self.state.name().to_string(),
                action: "submit a password".to_string(),
            });
        };

        request.password = Some(password);
        self.state = UploadState::Uploading {
            with_password: true,
            progress: 0.0,
            message: "Processing with password...".to_string(),
        };
        Ok(request)
    }

    /// Leave `Done`, clearing the transient state; returns the created count
    pub fn finish(&mut self) -> Result<u64, CoreError> {
        let UploadState::Done { created } = self.state else {
            return Err(self.invalid("finish"));
        };
        self.reset();
        Ok(created)
    }

    /// Leave `Error` once the message has been shown
    pub fn dismiss_error(&mut self) -> Result<(), CoreError> {
        if !matches!(self.state, UploadState::Error { .. }) {
            return Err(self.invalid("dismiss an error"));
        }
        self.reset();
        Ok(())
    }

    /// Abandon whatever is in progress; returns whether anything was
    pub fn cancel(&mut self) -> bool {
        let abandoned = !matches!(self.state, UploadState::Idle);
        if abandoned {
            log::info!(target: "hearth::flow", "upload abandoned while {}", self.state.name());
        }
        self.reset();
        abandoned
    }

    fn reset(&mut self) {
        self.state = UploadState::Idle;
        self.request = None;
    }
}

// ==================== Tests ====================
