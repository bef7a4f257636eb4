//! Server-sent event decoding for streamed statement uploads
//!
//! The upload endpoint answers with newline-delimited `data: <json>` frames.
//! This crate turns those bytes into progress events and a final outcome;
//! it knows nothing about HTTP.

pub mod error;
pub mod types;
pub mod decoder;

pub use decoder::{decode_all, resolve, SseDecoder, DEFAULT_FAILURE_MESSAGE};
pub use error::StreamError;
pub use types::{ProgressFrame, StreamOutcome, UploadProgressEvent, UploadSummary};
