//! Error types for hearth-stream

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The body ended without a frame carrying `success`, `requiresPassword`
    /// or `invalidPassword`
    #[error("Processing did not complete")]
    Incomplete,

    /// The server reported a terminal failure
    #[error("{message}")]
    Failed { message: String },
}
