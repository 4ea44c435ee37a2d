//! Property-backed events, for callers that already hold a typed request.

use super::{EventSource, EventValue, Field};
use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;

/// A typed request event. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    /// HTTP method, any case.
    pub method: Option<String>,
    /// Request path, possibly with a query suffix.
    pub path: Option<String>,
    /// Full or relative request URL.
    pub url: Option<String>,
    /// Headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Structured query parameters.
    pub query: Option<IndexMap<String, Vec<String>>>,
    /// Request body.
    pub body: Option<Bytes>,
}

impl GatewayRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Append a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Append a query parameter value.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(IndexMap::new)
            .entry(key.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl EventSource for GatewayRequest {
    fn get(&self, field: Field) -> Option<EventValue> {
        match field {
            Field::Method => self.method.clone().map(EventValue::Text),
            Field::Path => self.path.clone().map(EventValue::Text),
            Field::Url => self.url.clone().map(EventValue::Text),
            Field::Headers => Some(EventValue::Pairs(self.headers.clone())),
            Field::Body => self.body.clone().map(EventValue::Binary),
            Field::Query => self.query.as_ref().map(|query| {
                let object = query
                    .iter()
                    .map(|(key, values)| {
                        let values = values.iter().cloned().map(Value::String).collect();
                        (key.clone(), Value::Array(values))
                    })
                    .collect();
                EventValue::Structured(Value::Object(object))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_read_as_object_of_lists() {
        let event = GatewayRequest::new()
            .path("/listings")
            .query_param("make", "Honda")
            .query_param("make", "Toyota")
            .query_param("limit", "5");

        assert_eq!(
            event.get(Field::Query),
            Some(EventValue::Structured(serde_json::json!({
                "make": ["Honda", "Toyota"],
                "limit": ["5"],
            })))
        );
        assert_eq!(event.get(Field::Method), None);
        assert_eq!(event.get(Field::Body), None);
    }

    #[test]
    fn headers_keep_arrival_order() {
        let event = GatewayRequest::new()
            .header("Origin", "https://a.vercel.app")
            .header("origin", "https://b.vercel.app");

        assert_eq!(
            event.get(Field::Headers),
            Some(EventValue::Pairs(vec![
                ("Origin".into(), "https://a.vercel.app".into()),
                ("origin".into(), "https://b.vercel.app".into()),
            ]))
        );
    }
}
