//! # Message Delivery Wire Types
//!
//! Request and response bodies for the message delivery service. Field names
//! follow the service's JSON protocol (PascalCase).

use crate::constants::delivery;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetMessagesRequest {
    pub destination: String,
    pub messages_request_id: String,
    pub visibility_timeout_in_seconds: i64,
}

impl GetMessagesRequest {
    /// New retrieval request with a fresh correlation id
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            destination: instance_id.into(),
            messages_request_id: correlation_id(),
            visibility_timeout_in_seconds: delivery::VISIBILITY_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetMessagesOutput {
    pub destination: Option<String>,
    pub messages: Vec<PolledMessage>,
    pub messages_request_id: Option<String>,
}

impl GetMessagesOutput {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A message retrieved from the delivery queue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PolledMessage {
    pub message_id: Option<String>,
    pub destination: Option<String>,
    pub topic: Option<String>,
    pub payload: Option<String>,
    pub created_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AcknowledgeMessageRequest {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendReplyRequest {
    pub message_id: String,
    pub payload: String,
    pub reply_id: String,
}

impl SendReplyRequest {
    /// New reply with a fresh reply id
    pub fn new(message_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            payload: payload.into(),
            reply_id: correlation_id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailMessageRequest {
    pub message_id: String,
    pub failure_type: FailureType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageRequest {
    pub message_id: String,
}

/// Reason a message could not be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureType {
    /// The handler failed while processing the message
    InternalHandlerException,
    /// No handler exists for the message topic
    NoHandlerExists,
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InternalHandlerException => "InternalHandlerException",
            Self::NoHandlerExists => "NoHandlerExists",
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
