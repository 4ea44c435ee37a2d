//! Map-backed events, as delivered by JSON gateways.

use super::{EventSource, EventValue, Field};
use serde_json::Value;

/// An event backed by a JSON document.
///
/// Only a JSON object is readable; any other document exposes no fields.
#[derive(Debug, Clone, Copy)]
pub struct JsonEvent<'a> {
    value: &'a Value,
}

impl<'a> JsonEvent<'a> {
    /// Wrap a JSON document.
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }
}

impl EventSource for JsonEvent<'_> {
    fn get(&self, field: Field) -> Option<EventValue> {
        match self.value.as_object()?.get(field.as_str())? {
            Value::Null => None,
            Value::String(text) => Some(EventValue::Text(text.clone())),
            other => Some(EventValue::Structured(other.clone())),
        }
    }

    fn contains(&self, field: Field) -> bool {
        self.value
            .as_object()
            .is_some_and(|object| object.contains_key(field.as_str()))
    }

    fn is_readable(&self) -> bool {
        self.value.is_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_read_as_text_and_others_as_structured() {
        let value = json!({
            "method": "post",
            "headers": {"Origin": "https://a.vercel.app"},
            "body": null,
        });
        let event = JsonEvent::new(&value);

        assert_eq!(
            event.get(Field::Method),
            Some(EventValue::Text("post".into()))
        );
        assert!(matches!(
            event.get(Field::Headers),
            Some(EventValue::Structured(Value::Object(_)))
        ));
        assert_eq!(event.get(Field::Body), None);
        assert!(event.contains(Field::Body));
        assert_eq!(event.get(Field::Url), None);
        assert!(!event.contains(Field::Url));
    }

    #[test]
    fn non_object_documents_are_unreadable() {
        let value = json!(["GET", "/"]);
        let event = JsonEvent::new(&value);

        assert!(!event.is_readable());
        assert_eq!(event.get(Field::Method), None);
    }
}
