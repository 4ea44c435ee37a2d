//! Request normalizer: arbitrary inbound event to [`CanonicalRequest`].
//!
//! Every field is read leniently. Unexpected shapes degrade to defaults;
//! the only failure is an event that exposes nothing at all.

use super::AdapterError;
use crate::event::{EventSource, EventValue, Field};
use crate::http::{CanonicalRequest, Method};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Characters left literal in query keys and values: the unreserved set
/// plus `/`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Normalize an event, stripping `mount_prefix` from the path.
pub fn normalize(
    event: &dyn EventSource,
    mount_prefix: &str,
) -> Result<CanonicalRequest, AdapterError> {
    if !event.is_readable() {
        return Err(AdapterError::Normalization(
            "event is not an object and has no request fields".to_string(),
        ));
    }

    let url = event
        .get(Field::Url)
        .and_then(EventValue::into_text)
        .and_then(|raw| parse_url(&raw));
    let explicit_path = event
        .get(Field::Path)
        .and_then(EventValue::into_text)
        .filter(|path| !path.is_empty() && path != "/");
    let path_query = explicit_path
        .as_deref()
        .and_then(|path| path.split_once('?'))
        .map(|(_, query)| query.to_string());

    Ok(CanonicalRequest {
        method: resolve_method(event),
        path: resolve_path(explicit_path, url.as_ref(), mount_prefix),
        query_string: resolve_query(event, url.as_ref(), path_query),
        headers: resolve_headers(event),
        body: resolve_body(event),
    })
}

/// Lowercased headers of an event. Later duplicates win.
pub fn resolve_headers(event: &dyn EventSource) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    match event.get(Field::Headers) {
        Some(EventValue::Pairs(pairs)) => {
            for (name, value) in pairs {
                headers.insert(name.to_ascii_lowercase(), value);
            }
        }
        Some(EventValue::Structured(Value::Object(object))) => {
            for (name, value) in object {
                if let Some(value) = header_value(&value) {
                    headers.insert(name.to_ascii_lowercase(), value);
                }
            }
        }
        Some(other) => debug!(?other, "ignoring headers of unexpected shape"),
        None => {}
    }
    headers
}

fn resolve_method(event: &dyn EventSource) -> Method {
    let Some(raw) = event.get(Field::Method).and_then(EventValue::into_text) else {
        return Method::Get;
    };
    let token = raw.trim().to_ascii_uppercase();
    Method::from_token(&token).unwrap_or_else(|| {
        if !token.is_empty() {
            debug!(method = %token, "unknown HTTP method, falling back to GET");
        }
        Method::Get
    })
}

fn resolve_path(explicit: Option<String>, url: Option<&Url>, mount_prefix: &str) -> String {
    let mut path = match (explicit, url) {
        (Some(path), _) => path,
        (None, Some(url)) => url.path().to_string(),
        (None, None) => "/".to_string(),
    };

    if let Some(idx) = path.find('?') {
        path.truncate(idx);
    }
    if !mount_prefix.is_empty() {
        if let Some(rest) = path.strip_prefix(mount_prefix) {
            path = if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            };
        }
    }
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}

/// The `query` field wins, then the query of `url`, then whatever followed
/// `?` in the explicit path. A `query` field that is present but `null`
/// still wins and yields an empty query.
fn resolve_query(event: &dyn EventSource, url: Option<&Url>, path_query: Option<String>) -> String {
    match event.get(Field::Query) {
        Some(EventValue::Text(query)) => query,
        Some(EventValue::Structured(Value::Object(object))) => encode_query(
            object
                .iter()
                .flat_map(|(key, value)| query_values(value).map(move |v| (key.as_str(), v))),
        ),
        Some(EventValue::Pairs(pairs)) => {
            encode_query(pairs.iter().map(|(k, v)| (k.as_str(), v.clone())))
        }
        Some(other) => {
            debug!(?other, "ignoring query of unexpected shape");
            String::new()
        }
        None if event.contains(Field::Query) => String::new(),
        None => url
            .and_then(Url::query)
            .map(str::to_string)
            .or(path_query)
            .unwrap_or_default(),
    }
}

fn resolve_body(event: &dyn EventSource) -> Bytes {
    match event.get(Field::Body) {
        Some(EventValue::Text(text)) => Bytes::from(text),
        Some(EventValue::Binary(bytes)) => bytes,
        Some(EventValue::Structured(value)) if is_truthy(&value) => {
            serde_json::to_vec(&value).map(Bytes::from).unwrap_or_default()
        }
        Some(EventValue::Pairs(pairs)) if !pairs.is_empty() => {
            let object: serde_json::Map<String, Value> = pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            serde_json::to_vec(&object).map(Bytes::from).unwrap_or_default()
        }
        _ => Bytes::new(),
    }
}

fn parse_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .or_else(|_| Url::parse("http://localhost").and_then(|base| base.join(raw)))
        .map_err(|err| debug!(url = raw, error = %err, "unparseable url field"))
        .ok()
}

fn encode_query<'a>(pairs: impl Iterator<Item = (&'a str, String)>) -> String {
    pairs
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_COMPONENT),
                utf8_percent_encode(&value, QUERY_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn query_values(value: &Value) -> Box<dyn Iterator<Item = String> + '_> {
    match value {
        Value::Array(items) => Box::new(items.iter().map(scalar_text)),
        other => Box::new(std::iter::once(scalar_text(other))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn header_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(scalar_text(other)),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}
