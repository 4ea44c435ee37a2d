//! Canonical HTTP response and the value returned to the gateway.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

/// Response reassembled from the embedded application, before it is
/// shaped for the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Headers in the order the application emitted them.
    pub headers: IndexMap<String, String>,
    /// Decoded response body.
    pub body: String,
}

impl CanonicalResponse {
    /// Create an empty response with the given status code.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: IndexMap::new(),
            body: String::new(),
        }
    }

    /// Create a response with a JSON body.
    pub fn json<T: Serialize>(status: impl Into<StatusCode>, data: &T) -> Self {
        // Only maps with non-string keys fail here.
        let body = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
        Self::new(status)
            .header("Content-Type", "application/json")
            .body(body)
    }

    /// Add a header, replacing a header of the same exact name.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header, dropping any existing header whose name matches
    /// case-insensitively.
    pub fn set_header(&mut self, key: &str, value: impl Into<String>) {
        self.headers.retain(|name, _| !name.eq_ignore_ascii_case(key));
        self.headers.insert(key.to_string(), value.into());
    }

    /// Case-insensitive header lookup.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

impl Default for CanonicalResponse {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

/// The exact value the serverless gateway expects back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: IndexMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Parse the body as JSON.
    pub fn json_body<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl From<CanonicalResponse> for GatewayResponse {
    fn from(response: CanonicalResponse) -> Self {
        Self {
            status_code: response.status.0,
            headers: response.headers,
            body: response.body,
        }
    }
}
