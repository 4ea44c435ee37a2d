use crate::bridge::ApplicationError;
use std::error::Error as _;
use thiserror::Error;

/// Failures the adapter converts into 500 responses.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The inbound event carries no usable request information.
    #[error("unusable inbound event: {0}")]
    Normalization(String),
    /// The embedded application failed while handling the request.
    #[error(transparent)]
    Application(#[from] ApplicationError),
    /// The response body is not valid UTF-8. Recovered inside the bridge.
    #[error("response body is not valid UTF-8: {0}")]
    Serialization(String),
    /// The process-wide application could not be constructed.
    #[error("failed to initialize application: {0}")]
    Initialization(String),
}

impl AdapterError {
    /// Error kind reported in the error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            AdapterError::Normalization(_) => "NormalizationError",
            AdapterError::Application(_) => "ApplicationError",
            AdapterError::Serialization(_) => "SerializationError",
            AdapterError::Initialization(_) => "InitializationError",
        }
    }

    /// Human-readable diagnostic trace: the error and each of its causes.
    pub fn trace(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.kind(), self)];
        if let AdapterError::Application(inner) = self {
            lines.push(format!("  at application: {inner:?}"));
        }
        let mut source = self.source();
        while let Some(cause) = source {
            lines.push(format!("  caused by: {cause}"));
            source = cause.source();
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_trace() {
        let err = AdapterError::from(ApplicationError::new("database unreachable"));
        assert_eq!(err.kind(), "ApplicationError");
        assert_eq!(err.to_string(), "database unreachable");
        assert!(err.trace().starts_with("ApplicationError: database unreachable"));

        let err = AdapterError::Initialization("missing MONGODB_URI".into());
        assert_eq!(err.kind(), "InitializationError");
        assert!(err.trace().contains("missing MONGODB_URI"));
    }
}
