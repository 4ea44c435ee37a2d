//! The calling convention of the embedded application.

use super::Environ;
use bytes::Bytes;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised by the embedded application.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("{0}")]
    Failed(String),
    #[error("application panicked: {0}")]
    Panicked(String),
    #[error("invalid status line {0:?}")]
    InvalidStatus(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ApplicationError {
    /// Create a generic failure.
    pub fn new(message: impl Into<String>) -> Self {
        ApplicationError::Failed(message.into())
    }
}

/// A single-pass sequence of response body chunks.
///
/// The bridge calls [`BodyChunks::close`] exactly once after it stops
/// iterating, whether iteration finished, failed or panicked.
pub trait BodyChunks: Iterator<Item = Result<Bytes, ApplicationError>> + Send {
    /// Release whatever the body holds.
    fn close(&mut self) {}
}

/// An in-memory body made of pre-built chunks.
#[derive(Debug, Default)]
pub struct BufferedBody {
    chunks: VecDeque<Bytes>,
}

impl BufferedBody {
    /// A body of a single chunk.
    pub fn once(chunk: impl Into<Bytes>) -> Self {
        Self::from_chunks([chunk.into()])
    }

    /// A body of several chunks, emitted in order.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

impl Iterator for BufferedBody {
    type Item = Result<Bytes, ApplicationError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.pop_front().map(Ok)
    }
}

impl BodyChunks for BufferedBody {}

/// What the embedded application returns for one request.
pub struct AppResponse {
    /// Status line such as `200 OK`; only the leading code is significant.
    pub status_line: String,
    /// Response headers in emission order. Later duplicates win.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Box<dyn BodyChunks>,
}

impl AppResponse {
    /// Create an empty response with the canonical status line for `status`.
    pub fn new(status: u16) -> Self {
        let reason = hyper::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown");
        Self::with_status_line(format!("{status} {reason}"))
    }

    /// Create an empty response with a raw status line.
    pub fn with_status_line(status_line: impl Into<String>) -> Self {
        Self {
            status_line: status_line.into(),
            headers: Vec::new(),
            body: Box::new(BufferedBody::default()),
        }
    }

    /// Create a JSON response.
    pub fn json<T: Serialize>(status: u16, data: &T) -> Result<Self, ApplicationError> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::new(status)
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// Append a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Use a single-chunk body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Box::new(BufferedBody::once(body));
        self
    }

    /// Use a custom chunk source.
    pub fn chunks(mut self, body: impl BodyChunks + 'static) -> Self {
        self.body = Box::new(body);
        self
    }
}

impl std::fmt::Debug for AppResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppResponse")
            .field("status_line", &self.status_line)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The embedded request-handling application.
///
/// One instance lives for the whole process and may be called from several
/// gateway invocations; it must not rely on per-request mutable state.
pub trait Application: Send + Sync {
    /// Handle one request.
    fn call(&self, environ: Environ) -> Result<AppResponse, ApplicationError>;

    /// Release process-wide resources. Called once at process shutdown.
    fn shutdown(&self) {}
}
