//! Request environment handed to the embedded application.

use crate::http::{CanonicalRequest, Method};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

const CONTENT_TYPE: &str = "HTTP_CONTENT_TYPE";
const CONTENT_LENGTH: &str = "HTTP_CONTENT_LENGTH";

/// Request environment in the convention the application expects.
///
/// Ordinary headers are keyed `HTTP_<NAME>` with dashes turned into
/// underscores. Content type and length have their own fields and never
/// appear among the `HTTP_` keys.
#[derive(Debug)]
pub struct Environ {
    pub request_method: Method,
    pub path_info: String,
    pub query_string: String,
    pub content_type: String,
    pub content_length: usize,
    pub server_name: String,
    pub server_port: u16,
    pub url_scheme: &'static str,
    headers: BTreeMap<String, String>,
    input: Cursor<Bytes>,
}

impl Environ {
    /// Build the environment for a canonical request.
    pub fn from_request(request: CanonicalRequest) -> Self {
        let CanonicalRequest {
            method,
            path,
            query_string,
            headers,
            body,
        } = request;

        let mut content_type = String::new();
        let mut http_headers = BTreeMap::new();
        for (name, value) in headers {
            match environ_key(&name).as_str() {
                CONTENT_TYPE => content_type = value,
                CONTENT_LENGTH => {}
                key => {
                    http_headers.insert(key.to_string(), value);
                }
            }
        }

        Self {
            request_method: method,
            path_info: path,
            query_string,
            content_type,
            content_length: body.len(),
            server_name: "localhost".to_string(),
            server_port: 443,
            url_scheme: "https",
            headers: http_headers,
            input: Cursor::new(body),
        }
    }

    /// Look up a header by its HTTP name, e.g. `Authorization`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&environ_key(name)).map(String::as_str)
    }

    /// All `HTTP_` entries, sorted by key.
    pub fn http_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query_string.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Read the rest of the body stream.
    pub fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
        let mut body = Vec::with_capacity(self.content_length);
        self.input.read_to_end(&mut body)?;
        Ok(body)
    }
}

fn environ_key(name: &str) -> String {
    format!("HTTP_{}", name.to_ascii_uppercase().replace('-', "_"))
}
