//! Canonical HTTP request produced by the normalizer.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Parse an already uppercased method token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "PATCH" => Some(Method::Patch),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "CONNECT" => Some(Method::Connect),
            "TRACE" => Some(Method::Trace),
            _ => None,
        }
    }

    /// The method token as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }

    /// Browsers send `OPTIONS` as the CORS preflight probe.
    pub fn is_preflight(&self) -> bool {
        *self == Method::Options
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway-independent request handed to the protocol bridge.
///
/// Header keys are always lowercase and `path` always starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path without query string or mount prefix.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query_string: String,
    /// Lowercased header map.
    pub headers: HashMap<String, String>,
    /// Request body bytes.
    pub body: Bytes,
}

impl CanonicalRequest {
    /// Create a new request with no headers, query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_string: String::new(),
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header, lowercasing its name.
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the query string.
    pub fn query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Origin` header, if any.
    pub fn origin(&self) -> Option<&str> {
        self.get_header("origin")
    }
}

impl Default for CanonicalRequest {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let request = CanonicalRequest::default().header("Origin", "https://a.vercel.app");
        assert_eq!(request.get_header("ORIGIN"), Some("https://a.vercel.app"));
        assert_eq!(request.origin(), Some("https://a.vercel.app"));
    }

    #[test]
    fn only_options_is_preflight() {
        assert!(Method::Options.is_preflight());
        assert!(!Method::Get.is_preflight());
        assert_eq!(Method::from_token("DELETE"), Some(Method::Delete));
        assert_eq!(Method::from_token("delete"), None);
    }
}
