//! # Messaging Error Types
//!
//! Structured error types for the message delivery session using thiserror.
//! Every session-level error carries the name of the remote operation that
//! produced it so that callers and logs can tell `GetMessages` failures apart
//! from acknowledgement or reply failures.

use thiserror::Error;

/// Errors raised by a [`MessageTransport`](super::transport::MessageTransport)
/// while executing a single remote call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request could not be sent or the connection failed mid-flight.
    #[error("{0}")]
    Request(String),

    /// The remote side answered with a non-success status code.
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }
}

/// Session-level messaging errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessagingError {
    #[error("{operation} Error: {message}")]
    Transport { operation: String, message: String },

    #[error("{operation} Error: request cancelled")]
    Cancelled { operation: String },

    #[error("{operation} Error: serialization failed: {message}")]
    Serialization { operation: String, message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },
}

impl MessagingError {
    /// Wrap a transport failure with the operation name
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a cancellation error for the operation that was interrupted
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error was produced by `stop()` interrupting a call
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Name of the remote operation, when the error belongs to one
    pub fn operation(&self) -> Option<&str> {
        match self {
            Self::Transport { operation, .. }
            | Self::Cancelled { operation }
            | Self::Serialization { operation, .. } => Some(operation),
            Self::Configuration { .. } => None,
        }
    }
}

/// Result type alias for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_prefixed_with_operation() {
        let err = MessagingError::transport("AcknowledgeMessage", "connection refused");
        assert_eq!(err.to_string(), "AcknowledgeMessage Error: connection refused");
        assert_eq!(err.operation(), Some("AcknowledgeMessage"));

        let err = MessagingError::cancelled("GetMessages");
        assert_eq!(err.to_string(), "GetMessages Error: request cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "status 503: unavailable");

        let err = TransportError::request("connection reset by peer");
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[test]
    fn test_configuration_error_has_no_operation() {
        let err = MessagingError::configuration("http_transport", "empty endpoint");
        assert!(err.operation().is_none());
        assert!(!err.is_cancelled());
    }
}
