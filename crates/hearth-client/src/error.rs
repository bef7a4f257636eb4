//! Error types for hearth-client

use hearth_core::CoreError;
use hearth_stream::StreamError;
use thiserror::Error;

/// Message used when a failed response carries no `error` text
pub const DEFAULT_REQUEST_ERROR: &str = "Request failed";

/// Message used when a 401 response carries no `error` text
pub const SESSION_EXPIRED: &str = "Session expired, please log in again";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("Upload cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status behind the error, when there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Hint shown next to the message in the CLI
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ClientError::Unauthorized { .. } => Some("Run `hearth login` to start a new session"),
            ClientError::Http(err) if err.is_connect() => {
                Some("Check api.base_url in the config file or the HEARTH_API_URL variable")
            }
            ClientError::Stream(StreamError::Incomplete) => Some("The server closed the stream early; try again"),
            ClientError::Core(err) => err.suggestion(),
            _ => None,
        }
    }
}

impl From<std::convert::Infallible> for ClientError {
    fn from(value: std::convert::Infallible) -> Self {
        match value {}
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(value: serde_json::Error) -> Self {
        ClientError::Decode(value.to_string())
    }
}

/// Result type with ClientError
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ClientError::Api { status: 404, message: "Not found".to_string() };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found");

        let err = ClientError::Unauthorized { message: SESSION_EXPIRED.to_string() };
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert!(err.suggestion().is_some());

        assert_eq!(ClientError::Cancelled.status(), None);
    }

    #[test]
    fn test_stream_errors_keep_their_message() {
        let err = ClientError::from(StreamError::Failed { message: "Unsupported layout".to_string() });
        assert_eq!(err.to_string(), "Unsupported layout");
    }
}
