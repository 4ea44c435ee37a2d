//! Protocol bridge between canonical requests and the embedded application.

mod application;
mod environ;

pub use application::{AppResponse, Application, ApplicationError, BodyChunks, BufferedBody};
pub use environ::Environ;

use crate::adapter::AdapterError;
use crate::http::{CanonicalRequest, CanonicalResponse, StatusCode};
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Invoke the application once and reassemble its response.
///
/// Errors from the application, including ones raised while draining the
/// body, are returned unchanged. The body is closed on every path.
pub fn invoke(
    app: &dyn Application,
    request: CanonicalRequest,
) -> Result<CanonicalResponse, ApplicationError> {
    let environ = Environ::from_request(request);
    let AppResponse {
        status_line,
        headers,
        body,
    } = app.call(environ)?;

    let mut body = BodyGuard::new(body);
    let status = parse_status(&status_line)?;
    let bytes = body.drain()?;
    body.close();

    let headers: IndexMap<String, String> = headers.into_iter().collect();
    debug!(status = status.0, bytes = bytes.len(), "application responded");

    Ok(CanonicalResponse {
        status,
        headers,
        body: decode_body(bytes),
    })
}

fn parse_status(status_line: &str) -> Result<StatusCode, ApplicationError> {
    status_line
        .split_whitespace()
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .map(StatusCode)
        .ok_or_else(|| ApplicationError::InvalidStatus(status_line.to_string()))
}

fn decode_body(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let fallback = format!("b'{}'", err.as_bytes().escape_ascii());
            let err = AdapterError::Serialization(err.utf8_error().to_string());
            warn!(error = %err, "response body is not UTF-8, returning raw representation");
            fallback
        }
    }
}

/// Owns the body while it is drained and closes it exactly once.
struct BodyGuard {
    body: Box<dyn BodyChunks>,
    closed: bool,
}

impl BodyGuard {
    fn new(body: Box<dyn BodyChunks>) -> Self {
        Self {
            body,
            closed: false,
        }
    }

    fn drain(&mut self) -> Result<Vec<u8>, ApplicationError> {
        let mut buf = Vec::new();
        for chunk in self.body.by_ref() {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.body.close();
        }
    }
}

impl Drop for BodyGuard {
    fn drop(&mut self) {
        self.close();
    }
}
