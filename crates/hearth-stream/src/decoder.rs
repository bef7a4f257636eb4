//! Incremental decoder for `data: <json>` lines
//!
//! The body arrives in arbitrary chunks; a line is only decoded once its
//! terminating `\n` has been seen, so frames and multi-byte characters split
//! across chunks come out whole.

use crate::error::StreamError;
use crate::types::{ProgressFrame, StreamOutcome, UploadProgressEvent, UploadSummary};

const DATA_PREFIX: &str = "data: ";

/// Message used when a failed terminal frame carries no text of its own
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to process file";

/// Decodes an upload response body and tracks its terminal frame
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    final_frame: Option<ProgressFrame>,
    frames: usize,
    skipped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk, relaying progress frames to `on_progress`
    pub fn push<F>(&mut self, chunk: &[u8], on_progress: &mut F)
    where
        F: FnMut(&UploadProgressEvent),
    {
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&line[..line.len() - 1], on_progress);
        }
    }

    /// Flush the trailing partial line and resolve the stream
    pub fn finish<F>(mut self, on_progress: &mut F) -> Result<StreamOutcome, StreamError>
    where
        F: FnMut(&UploadProgressEvent),
    {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.handle_line(&rest, on_progress);
        }
        log::debug!(
            target: "hearth::stream",
            "stream ended after {} frames ({} skipped)",
            self.frames,
            self.skipped
        );
        resolve(self.final_frame)
    }

    /// Number of frames decoded so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Number of `data:` lines that were not valid JSON
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Last terminal frame seen so far
    pub fn final_frame(&self) -> Option<&ProgressFrame> {
        self.final_frame.as_ref()
    }

    fn handle_line<F>(&mut self, raw: &[u8], on_progress: &mut F)
    where
        F: FnMut(&UploadProgressEvent),
    {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches('\r');
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };

        match serde_json::from_str::<ProgressFrame>(payload) {
            Ok(frame) => {
                self.frames += 1;
                log::debug!(target: "hearth::stream", "frame received: {:?}", frame);

                // The terminal frame is recorded before the callback runs.
                if frame.is_terminal() {
                    self.final_frame = Some(frame.clone());
                }
                if frame.is_progress() {
                    on_progress(&frame.to_event());
                }
            }
            Err(e) => {
                self.skipped += 1;
                log::warn!(target: "hearth::stream", "unparseable frame {:?}: {}", payload, e);
            }
        }
    }
}

/// Decide the outcome from the last terminal frame
pub fn resolve(final_frame: Option<ProgressFrame>) -> Result<StreamOutcome, StreamError> {
    let Some(frame) = final_frame else {
        return Err(StreamError::Incomplete);
    };

    let message = frame.message.clone().unwrap_or_default();

    // An invalid password implies a password is required; report the more specific one.
    if frame.invalid_password == Some(true) {
        return Ok(StreamOutcome::InvalidPassword { message });
    }
    if frame.requires_password == Some(true) {
        return Ok(StreamOutcome::NeedsPassword { message });
    }

    if frame.success == Some(true) {
        return Ok(StreamOutcome::Completed(UploadSummary {
            transactions_created: frame.transactions_created.unwrap_or(0),
            filename: frame.filename,
            originalname: frame.originalname,
        }));
    }

    let message = frame
        .error
        .filter(|e| !e.is_empty())
        .or(frame.message.filter(|m| !m.is_empty()))
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
    Err(StreamError::Failed { message })
}

/// Decode a complete body in one go
pub fn decode_all<F>(body: &[u8], on_progress: &mut F) -> Result<StreamOutcome, StreamError>
where
    F: FnMut(&UploadProgressEvent),
{
    let mut decoder = SseDecoder::new();
    decoder.push(body, on_progress);
    decoder.finish(on_progress)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(body: &str) -> (Vec<UploadProgressEvent>, Result<StreamOutcome, StreamError>) {
        let mut events = Vec::new();
        let result = decode_all(body.as_bytes(), &mut |e: &UploadProgressEvent| events.push(e.clone()));
        (events, result)
    }

    #[test]
    fn test_success_frame_resolves_with_count() {
        let body = "data: {\"progress\":10,\"message\":\"Reading\"}\n\
                    data: {\"progress\":100,\"message\":\"Done\",\"success\":true,\"transactionsCreated\":7}\n";
        let (events, result) = collect(body);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].progress, 10.0);
        assert_eq!(events[0].message, "Reading");
        let outcome = result.unwrap();
        assert_eq!(outcome.transactions_created(), Some(7));
    }

    #[test]
    fn test_requires_password_is_not_an_error() {
        let (events, result) = collect("data: {\"requiresPassword\":true,\"message\":\"Protected file\"}\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].requires_password, Some(true));

        let outcome = result.unwrap();
        assert!(outcome.requires_password());
        assert_eq!(outcome, StreamOutcome::NeedsPassword { message: "Protected file".to_string() });
    }

    #[test]
    fn test_invalid_password_is_not_an_error() {
        let (_, result) = collect("data: {\"requiresPassword\":true,\"invalidPassword\":true}\n");
        assert!(result.unwrap().invalid_password());
    }

    #[test]
    fn test_invalid_password_wins_over_requires_password() {
        let (_, result) = collect("data: {\"requiresPassword\":true,\"invalidPassword\":true,\"message\":\"Wrong password\"}\n");
        assert_eq!(
            result.unwrap(),
            StreamOutcome::InvalidPassword { message: "Wrong password".to_string() }
        );
    }

    #[test]
    fn test_terminal_frame_without_progress_is_not_relayed() {
        let (events, result) = collect("data: {\"success\":true,\"transactionsCreated\":2}\n");
        assert!(events.is_empty());
        assert_eq!(result.unwrap().transactions_created(), Some(2));
    }

    #[test]
    fn test_missing_terminal_frame_fails() {
        let (events, result) = collect("data: {\"progress\":50,\"message\":\"Halfway\"}\n");
        assert_eq!(events.len(), 1);
        assert_eq!(result.unwrap_err(), StreamError::Incomplete);
        assert_eq!(StreamError::Incomplete.to_string(), "Processing did not complete");
    }

    #[test]
    fn test_failed_terminal_frame_uses_error_then_message() {
        let (_, result) = collect("data: {\"success\":false,\"error\":\"Unsupported bank\",\"message\":\"Oops\"}\n");
        assert_eq!(result.unwrap_err(), StreamError::Failed { message: "Unsupported bank".to_string() });

        let (_, result) = collect("data: {\"success\":false,\"message\":\"Oops\"}\n");
        assert_eq!(result.unwrap_err(), StreamError::Failed { message: "Oops".to_string() });

        let (_, result) = collect("data: {\"success\":false}\n");
        assert_eq!(
            result.unwrap_err(),
            StreamError::Failed { message: DEFAULT_FAILURE_MESSAGE.to_string() }
        );
    }

    #[test]
    fn test_last_terminal_frame_wins() {
        let body = "data: {\"success\":false,\"message\":\"retrying\"}\n\
                    data: {\"success\":true,\"transactionsCreated\":3}\n";
        let (_, result) = collect(body);
        assert_eq!(result.unwrap().transactions_created(), Some(3));
    }

    #[test]
    fn test_chunk_split_frames_decode_whole() {
        let body = "data: {\"progress\":40,\"message\":\"Lendo extrato\"}\r\n\
                    : keep-alive\n\
                    data: {\"success\":true,\"transactionsCreated\":5,\"progress\":100,\"message\":\"Concluído\"}\n";
        let bytes = body.as_bytes();

        for split in [1, 7, 13, 30, bytes.len() - 3] {
            let mut events = Vec::new();
            let mut decoder = SseDecoder::new();
            let mut on_progress = |e: &UploadProgressEvent| events.push(e.clone());
            decoder.push(&bytes[..split], &mut on_progress);
            decoder.push(&bytes[split..], &mut on_progress);
            let result = decoder.finish(&mut on_progress);

            assert_eq!(events.len(), 2, "split at {}", split);
            assert_eq!(events[0].message, "Lendo extrato");
            assert_eq!(events[1].message, "Concluído");
            assert_eq!(result.unwrap().transactions_created(), Some(5));
        }
    }

    #[test]
    fn test_trailing_line_without_newline_is_processed() {
        let (_, result) = collect("data: {\"success\":true,\"transactionsCreated\":1}");
        assert_eq!(result.unwrap().transactions_created(), Some(1));
    }

    #[test]
    fn test_malformed_frames_are_skipped() {
        let mut decoder = SseDecoder::new();
        let mut count = 0;
        let mut on_progress = |_: &UploadProgressEvent| count += 1;
        decoder.push(b"data: {not json}\ndata: {\"progress\":5}\n", &mut on_progress);

        assert_eq!(decoder.skipped(), 1);
        assert_eq!(decoder.frames(), 1);
        assert!(decoder.final_frame().is_none());
        assert_eq!(decoder.finish(&mut on_progress).unwrap_err(), StreamError::Incomplete);
        assert_eq!(count, 1);
    }
}
