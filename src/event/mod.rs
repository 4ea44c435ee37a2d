//! Inbound serverless events.
//!
//! Gateways hand us events of no fixed shape: sometimes a JSON document,
//! sometimes a typed request object, often a partial subset of either. The
//! normalizer never looks at a concrete representation; it only asks an
//! [`EventSource`] for individual fields.

mod gateway;
mod json;

pub use gateway::GatewayRequest;
pub use json::JsonEvent;

use bytes::Bytes;
use serde_json::Value;

/// Fields the normalizer knows how to read from an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Path,
    Url,
    Method,
    Headers,
    Body,
    Query,
}

impl Field {
    /// Field name as it appears in a JSON event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Path => "path",
            Field::Url => "url",
            Field::Method => "method",
            Field::Headers => "headers",
            Field::Body => "body",
            Field::Query => "query",
        }
    }
}

/// A single field value pulled out of an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    /// Plain text.
    Text(String),
    /// Raw bytes.
    Binary(Bytes),
    /// Anything else: numbers, booleans, arrays, objects.
    Structured(Value),
    /// Ordered name/value pairs, duplicates allowed.
    Pairs(Vec<(String, String)>),
}

impl EventValue {
    /// Consume the value, keeping it only if it is textual.
    pub fn into_text(self) -> Option<String> {
        match self {
            EventValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Field accessor over an event of unknown concrete shape.
pub trait EventSource {
    /// Read a field. Absent and `null` fields both read as `None`.
    fn get(&self, field: Field) -> Option<EventValue>;

    /// Whether the event names the field at all, even as `null`.
    fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Whether the event carries any request information at all.
    fn is_readable(&self) -> bool {
        true
    }
}
