//! Frame and event types for the upload stream

use serde::{Deserialize, Serialize};

/// One `data: {...}` payload as sent by the upload endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressFrame {
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub success: Option<bool>,
    pub transactions_created: Option<u64>,
    pub filename: Option<String>,
    pub originalname: Option<String>,
    pub error: Option<String>,
    pub requires_password: Option<bool>,
    pub invalid_password: Option<bool>,
}

impl ProgressFrame {
    /// Frames that decide how the upload ends
    pub fn is_terminal(&self) -> bool {
        self.success.is_some() || self.requires_password.is_some() || self.invalid_password.is_some()
    }

    /// Frames that should be relayed to the progress callback
    pub fn is_progress(&self) -> bool {
        self.progress.is_some() || self.message.is_some()
    }

    /// Normalized event for the progress callback
    pub fn to_event(&self) -> UploadProgressEvent {
        UploadProgressEvent {
            progress: self.progress.unwrap_or(0.0),
            message: self.message.clone().unwrap_or_default(),
            success: self.success,
            transactions_created: self.transactions_created,
            filename: self.filename.clone(),
            originalname: self.originalname.clone(),
            error: self.error.clone(),
            requires_password: self.requires_password,
            invalid_password: self.invalid_password,
        }
    }
}

/// Progress update handed to callers while the stream is read
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressEvent {
    /// Percentage, 0 to 100
    pub progress: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions_created: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub originalname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_password: Option<bool>,
}

/// Result of a successful import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub transactions_created: u64,
    pub filename: Option<String>,
    pub originalname: Option<String>,
}

/// How a finished stream resolved when it did not fail
///
/// The password cases are regular outcomes so callers can prompt and retry.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    Completed(UploadSummary),
    NeedsPassword { message: String },
    InvalidPassword { message: String },
}

impl StreamOutcome {
    pub fn requires_password(&self) -> bool {
        matches!(self, StreamOutcome::NeedsPassword { .. })
    }

    pub fn invalid_password(&self) -> bool {
        matches!(self, StreamOutcome::InvalidPassword { .. })
    }

    pub fn transactions_created(&self) -> Option<u64> {
        match self {
            StreamOutcome::Completed(summary) => Some(summary.transactions_created),
            _ => None,
        }
    }
}
