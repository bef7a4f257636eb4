//! HTTP client for the hearth backend
//!
//! - client: JSON envelope handling, bearer auth and 401 handling
//! - upload: streamed statement upload with progress and cancellation
//! - import: upload flow driver with password retries and reload
//! - services: one service per backend resource
//! - session: shared session context and its on-disk store

pub mod cancel;
pub mod client;
pub mod error;
pub mod import;
pub mod services;
pub mod session;
pub mod upload;

#[cfg(test)]
mod test_support;

pub use cancel::Cancellation;
pub use client::{ApiClient, ApiResponse};
pub use error::{ClientError, ClientResult};
pub use import::{ImportReport, PasswordPrompt, PasswordRequest, StatementImport};
pub use services::RegisterData;
pub use session::{Session, SessionContext, SessionStore};
pub use upload::DEFAULT_UPLOAD_ERROR;
