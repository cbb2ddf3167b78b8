//! Assistant creation: multipart upload plus the streamed progress feed.
//!
//! `POST /assistants/` answers with a body of newline-delimited JSON
//! [`CreateProgress`] records, read incrementally as bytes arrive. Each
//! complete line is decoded independently and forwarded to the caller's
//! reporter in arrival order:
//!
//! - a malformed line is logged and skipped; later lines still count
//! - an `error` record aborts the read and surfaces its message
//! - a `complete` record carries the new assistant's id, which becomes
//!   the result of the whole call
//! - a stream that ends without ever producing a `complete` record is an
//!   explicit error: the call either yields a usable id or fails
//!
//! No retry, no resumption, no client-enforced timeout on the stream.

use std::path::Path;

use futures::StreamExt;

use crate::client::{error_from_response, ApiClient, ApiError};
use crate::models::{CreateProgress, ProgressStatus};
use crate::progress::CreateProgressReporter;

/// Upper bounds applied client-side before submission. The server remains
/// the authority on what it accepts.
pub const MAX_TOP_K: i64 = 20;
pub const MAX_CHUNK_SIZE: i64 = 1024;
pub const MAX_CHUNK_OVERLAP: i64 = 150;

/// Creation parameters forwarded as multipart form fields alongside the file.
#[derive(Debug, Clone)]
pub struct CreateAssistantParams {
    pub name: String,
    pub temperature: f64,
    pub top_k: i64,
    pub chunk_size: i64,
    pub chunk_overlap: i64,
}

impl CreateAssistantParams {
    /// Clamp numeric parameters to their fixed client-side ranges.
    pub fn clamped(&self) -> Self {
        Self {
            name: self.name.clone(),
            temperature: self.temperature.clamp(0.0, 1.0),
            top_k: self.top_k.clamp(1, MAX_TOP_K),
            chunk_size: self.chunk_size.clamp(1, MAX_CHUNK_SIZE),
            chunk_overlap: self.chunk_overlap.clamp(0, MAX_CHUNK_OVERLAP),
        }
    }
}

impl ApiClient {
    /// Upload a PDF and stream creation progress until the backend signals
    /// completion. Resolves to the new assistant's id.
    ///
    /// The file must have a `.pdf` extension (checked before submission,
    /// not re-validated after). A 403 before streaming begins means the
    /// plan limit was reached.
    pub async fn create_assistant(
        &self,
        params: &CreateAssistantParams,
        file: &Path,
        reporter: &dyn CreateProgressReporter,
    ) -> Result<String, ApiError> {
        let is_pdf = file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(ApiError::InvalidInput(format!(
                "Only PDF files are allowed: {}",
                file.display()
            )));
        }

        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Failed to read {}: {}", file.display(), e)))?;

        let params = params.clamped();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .text("name", params.name)
            .text("temperature", params.temperature.to_string())
            .text("top_k", params.top_k.to_string())
            .text("chunk_size", params.chunk_size.to_string())
            .text("chunk_overlap", params.chunk_overlap.to_string())
            .part("file", part);

        // Streamed request — deliberately no timeout (see module docs).
        let resp = self
            .authed(self.streaming.post(self.url("/assistants/")).multipart(form))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            if status.as_u16() == 403 {
                return Err(ApiError::PlanLimit);
            }
            return Err(error_from_response(resp).await);
        }

        read_progress_stream(resp, reporter).await
    }
}

/// Consume the NDJSON body incrementally and fold it through a
/// [`ProgressDecoder`].
async fn read_progress_stream(
    resp: reqwest::Response,
    reporter: &dyn CreateProgressReporter,
) -> Result<String, ApiError> {
    let mut stream = resp.bytes_stream();
    let mut buffer = LineBuffer::default();
    let mut decoder = ProgressDecoder::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for line in buffer.push(&chunk) {
            decoder.accept(&line, reporter)?;
        }
    }

    // The backend terminates every line with '\n', but a truncated final
    // line is still worth decoding.
    if let Some(line) = buffer.finish() {
        decoder.accept(&line, reporter)?;
    }

    decoder.finish()
}

/// Incremental splitter turning arbitrary byte chunks into whole lines.
/// Blank lines are dropped; the trailing partial line is held back until
/// more bytes arrive or the stream ends.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    /// Feed one chunk of bytes; returns the complete lines it closed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line = self.buf[..pos].trim().to_string();
            self.buf.drain(..=pos);
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Drain any unterminated final line.
    pub fn finish(&mut self) -> Option<String> {
        let line = self.buf.trim().to_string();
        self.buf.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

/// Folds progress records into a final assistant id.
#[derive(Debug, Default)]
pub struct ProgressDecoder {
    assistant_id: Option<String>,
}

impl ProgressDecoder {
    /// Decode one line and forward it to the reporter.
    ///
    /// Malformed JSON is skipped (logged at warn), preserving the rest of
    /// the stream. An `error` record aborts with its message.
    pub fn accept(
        &mut self,
        line: &str,
        reporter: &dyn CreateProgressReporter,
    ) -> Result<(), ApiError> {
        let record: CreateProgress = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, line, "skipping malformed progress line");
                return Ok(());
            }
        };

        reporter.report(&record);

        match record.status {
            ProgressStatus::Error => Err(ApiError::Stream(record.message)),
            ProgressStatus::Complete => {
                if let Some(id) = record.assistant_id {
                    self.assistant_id = Some(id);
                } else {
                    tracing::warn!("complete record without an assistant_id");
                }
                Ok(())
            }
            ProgressStatus::Uploading | ProgressStatus::Processing => Ok(()),
        }
    }

    /// Called at stream end: completion without an id is a protocol error.
    pub fn finish(self) -> Result<String, ApiError> {
        self.assistant_id.ok_or_else(|| {
            ApiError::Stream("stream ended before a 'complete' record was received".to_string())
        })
    }
}
