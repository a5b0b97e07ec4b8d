//! # Message Poll Loop
//!
//! Drives a [`MessageDeliveryService`] for one instance: long-poll, acknowledge
//! each message, hand it to a [`MessageHandler`] and settle it with a reply, a
//! delete or a failure report.

use super::errors::MessagingResult;
use super::message::{FailureType, PolledMessage};
use super::session::MessageDeliveryService;
use crate::config::PollerConfig;
use crate::logging::log_error;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// What the handler wants done with a processed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Send this payload as the reply
    Reply(String),
    /// Remove the message from the queue without replying
    Delete,
    /// Nothing further to send
    Done,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("No handler exists for topic: {0}")]
    NoHandler(String),

    #[error("Handler failed: {0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failure_type(&self) -> FailureType {
        match self {
            Self::NoHandler(_) => FailureType::NoHandlerExists,
            Self::Failed(_) => FailureType::InternalHandlerException,
        }
    }
}

#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &PolledMessage) -> Result<HandlerOutcome, HandlerError>;
}

/// How a single polled message was settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    Replied(String),
    Deleted(String),
    Completed(String),
    Failed {
        message_id: String,
        failure_type: FailureType,
    },
    /// The message carried no id and could not be acknowledged
    Skipped,
}

pub struct MessagePoller {
    service: Arc<dyn MessageDeliveryService>,
    handler: Arc<dyn MessageHandler>,
    instance_id: String,
    error_backoff: Duration,
    stopped: AtomicBool,
    shutdown_notify: Notify,
}

impl MessagePoller {
    pub fn new(
        service: Arc<dyn MessageDeliveryService>,
        handler: Arc<dyn MessageHandler>,
        instance_id: impl Into<String>,
        config: &PollerConfig,
    ) -> Self {
        Self {
            service,
            handler,
            instance_id: instance_id.into(),
            error_backoff: config.error_backoff(),
            stopped: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Poll until [`stop`](Self::stop) is called.
    ///
    /// Unexpected retrieval errors are logged and followed by the configured backoff.
    pub async fn run(&self) -> MessagingResult<()> {
        info!(instance_id = %self.instance_id, "Starting message poll loop");

        while !self.is_stopped() {
            match self.poll_once().await {
                Ok(dispositions) => {
                    if !dispositions.is_empty() {
                        debug!(count = dispositions.len(), "Processed polled messages");
                    }
                }
                Err(e) if e.is_cancelled() && self.is_stopped() => break,
                Err(e) => {
                    log_error("message_poller", "get_messages", &e.to_string(), None);
                    tokio::select! {
                        _ = tokio::time::sleep(self.error_backoff) => {}
                        _ = self.shutdown_notify.notified() => break,
                    }
                }
            }
        }

        info!(instance_id = %self.instance_id, "Message poll loop shutting down");
        Ok(())
    }

    /// Stop the loop and cancel any blocked long poll
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
        self.service.stop();
    }

    /// One retrieval round. Per-message RPC failures are logged and left out of the result.
    pub async fn poll_once(&self) -> MessagingResult<Vec<MessageDisposition>> {
        let output = self.service.get_messages(&self.instance_id).await?;

        let mut dispositions = Vec::with_capacity(output.messages.len());
        for message in &output.messages {
            match self.process_message(message).await {
                Ok(disposition) => dispositions.push(disposition),
                Err(e) => log_error(
                    "message_poller",
                    "process_message",
                    &e.to_string(),
                    message.message_id.as_deref(),
                ),
            }
        }
        Ok(dispositions)
    }

    async fn process_message(&self, message: &PolledMessage) -> MessagingResult<MessageDisposition> {
        let Some(message_id) = message.message_id.as_deref() else {
            warn!(topic = ?message.topic, "Skipping message without an id");
            return Ok(MessageDisposition::Skipped);
        };

        self.service.acknowledge_message(message_id).await?;

        match self.handler.handle(message).await {
            Ok(HandlerOutcome::Reply(payload)) => {
                self.service.send_reply(message_id, &payload).await?;
                Ok(MessageDisposition::Replied(message_id.to_string()))
            }
            Ok(HandlerOutcome::Delete) => {
                self.service.delete_message(message_id).await?;
                Ok(MessageDisposition::Deleted(message_id.to_string()))
            }
            Ok(HandlerOutcome::Done) => Ok(MessageDisposition::Completed(message_id.to_string())),
            Err(e) => {
                let failure_type = e.failure_type();
                warn!(message_id = %message_id, error = %e, "Message handler failed");
                self.service.fail_message(message_id, failure_type).await?;
                Ok(MessageDisposition::Failed {
                    message_id: message_id.to_string(),
                    failure_type,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_failure_types() {
        assert_eq!(
            HandlerError::NoHandler("aws.ssm.unknown".to_string()).failure_type(),
            FailureType::NoHandlerExists
        );
        assert_eq!(
            HandlerError::Failed("boom".to_string()).failure_type(),
            FailureType::InternalHandlerException
        );
    }

    #[test]
    fn test_handler_error_display() {
        let err = HandlerError::NoHandler("aws.ssm.unknown".to_string());
        assert_eq!(err.to_string(), "No handler exists for topic: aws.ssm.unknown");
    }
}
