//! # Agent Error Types
//!
//! Crate-level error type for association processing, configuration and
//! collaborator failures. Message delivery has its own error type in
//! [`crate::messaging::errors`] which converts into this one.

use crate::messaging::errors::MessagingError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Instance identity error: {0}")]
    InstanceIdentity(String),

    #[error("Association directory error: {operation}: {message}")]
    Directory { operation: String, message: String },

    #[error("Association field missing: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid schedule expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Invalid association id payload: {0}")]
    InvalidPayload(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("IO error: {path}: {message}")]
    Io { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Create a directory error tagged with the failing operation
    pub fn directory(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Directory {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an invalid expression error
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error for the given path
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Free-form error carrying an already formatted message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        AgentError::io("unknown", err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl From<MessagingError> for AgentError {
    fn from(err: MessagingError) -> Self {
        AgentError::Messaging(err.to_string())
    }
}

impl From<config::ConfigError> for AgentError {
    fn from(err: config::ConfigError) -> Self {
        AgentError::Configuration(err.to_string())
    }
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::directory("list", "endpoint unreachable");
        assert_eq!(
            err.to_string(),
            "Association directory error: list: endpoint unreachable"
        );

        let err = AgentError::MissingField {
            field: "association_id",
        };
        assert_eq!(err.to_string(), "Association field missing: association_id");
    }

    #[test]
    fn test_messaging_conversion_keeps_operation_name() {
        let messaging = MessagingError::transport("GetMessages", "connection refused");
        let agent: AgentError = messaging.into();
        assert!(matches!(agent, AgentError::Messaging(_)));
        assert!(agent.to_string().contains("GetMessages"));
    }
}
