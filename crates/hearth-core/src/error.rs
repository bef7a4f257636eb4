//! Error types for hearth-core
//!
//! Covers the transaction model and the upload flow. Every error carries a
//! stable code, a severity used to pick the log level, and where possible a
//! suggestion the CLI prints below the message.

use thiserror::Error;

/// How serious an error is for the operation that raised it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected during normal use, such as an empty password field
    Info,
    /// The operation was refused but nothing is broken
    Warning,
    Error,
}

impl ErrorSeverity {
    pub fn level(self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Invalid installment label: {label}")]
    InvalidInstallment { label: String },

    #[error("No future installments to generate: {reason}")]
    NothingToGenerate { reason: String },

    #[error("Invalid reference month: {value}")]
    InvalidReferenceMonth { value: String },

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Transaction not found: {id}")]
    TransactionNotFound { id: String },

    #[error("Cannot read {path}: {message}")]
    ReadError { path: String, message: String },
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ValidationError { .. } => "VALIDATION_ERROR",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::InvalidInstallment { .. } => "INVALID_INSTALLMENT",
            CoreError::NothingToGenerate { .. } => "NOTHING_TO_GENERATE",
            CoreError::InvalidReferenceMonth { .. } => "INVALID_REFERENCE_MONTH",
            CoreError::EmptyPassword => "EMPTY_PASSWORD",
            CoreError::TransactionNotFound { .. } => "TRANSACTION_NOT_FOUND",
            CoreError::ReadError { .. } => "READ_ERROR",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::ValidationError { .. }
            | CoreError::InvalidTransition { .. }
            | CoreError::InvalidInstallment { .. }
            | CoreError::ReadError { .. } => ErrorSeverity::Error,
            CoreError::NothingToGenerate { .. } | CoreError::InvalidReferenceMonth { .. } => ErrorSeverity::Warning,
            CoreError::EmptyPassword | CoreError::TransactionNotFound { .. } => ErrorSeverity::Info,
        }
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CoreError::ValidationError { .. } => {
                Some("Select an image (JPG, PNG), a PDF or a spreadsheet (Excel, CSV) within the size limit")
            }
            CoreError::InvalidInstallment { .. } => Some("Installments are written as current/total, for example 2/10"),
            CoreError::InvalidReferenceMonth { .. } => Some("Use YYYY-MM with a month between 01 and 12"),
            CoreError::TransactionNotFound { .. } => Some("Run `hearth transactions list` to see the loaded transactions"),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Operation name plus whatever identifies its input
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub operation: String,
    pub data: serde_json::Value,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            data: serde_json::json!({}),
        }
    }

    pub fn with_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.data[key] = value;
        self
    }
}

pub trait ErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
    fn log_warning(&self, message: &str, context: &ErrorContext);
}

/// Logs through the `log` crate under `hearth::error`
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        log::log!(
            target: "hearth::error",
            error.severity().level(),
            "[{}] {} (operation: {}, data: {})",
            error.code(),
            error,
            context.operation,
            context.data
        );
    }

    fn log_warning(&self, message: &str, context: &ErrorContext) {
        log::warn!(
            target: "hearth::error",
            "{} (operation: {}, data: {})",
            message,
            context.operation,
            context.data
        );
    }
}
