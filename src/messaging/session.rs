//! # Message Delivery Session
//!
//! Long-poll client over the message delivery queue.
//!
//! Every remote action follows the same shape: build the request, register a
//! cancellation handle as the session's outstanding request, send, clear the
//! registration when the call returns and wrap transport failures with the
//! operation name.
//!
//! ## Cancellation
//!
//! The session holds at most one outstanding-request handle behind a
//! `parking_lot::Mutex`. The handle is registered before the transport is
//! called and cleared as soon as the call returns, so [`stop`] never targets a
//! finished call and never misses one that is in flight. `stop` only fires the
//! handle; it never waits for the interrupted call.
//!
//! [`stop`]: MessageDeliveryService::stop

use super::classifier::LongPollErrorClassifier;
use super::errors::{MessagingError, MessagingResult, TransportError};
use super::message::{
    AcknowledgeMessageRequest, DeleteMessageRequest, FailMessageRequest, FailureType,
    GetMessagesOutput, GetMessagesRequest, SendReplyRequest,
};
use super::transport::{HttpTransport, MessageTransport};
use crate::config::MessageDeliveryConfig;
use crate::constants::delivery::{self, operations};
use crate::logging::log_message_operation;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Remote actions against the message delivery queue
#[async_trait]
pub trait MessageDeliveryService: Send + Sync {
    /// Long-poll for messages addressed to `instance_id`.
    ///
    /// Expected long-poll disconnects yield an empty output instead of an error.
    async fn get_messages(&self, instance_id: &str) -> MessagingResult<GetMessagesOutput>;

    async fn acknowledge_message(&self, message_id: &str) -> MessagingResult<()>;

    async fn send_reply(&self, message_id: &str, payload: &str) -> MessagingResult<()>;

    async fn fail_message(&self, message_id: &str, failure_type: FailureType)
        -> MessagingResult<()>;

    async fn delete_message(&self, message_id: &str) -> MessagingResult<()>;

    /// Cancel the outstanding request, if any. Never blocks.
    fn stop(&self);
}

enum SendFailure {
    Cancelled,
    Transport(TransportError),
}

/// Clears the outstanding slot on drop, but only while it still holds this handle
struct OutstandingRequest<'a> {
    slot: &'a Mutex<Option<Arc<Notify>>>,
    handle: Arc<Notify>,
}

impl<'a> OutstandingRequest<'a> {
    fn register(slot: &'a Mutex<Option<Arc<Notify>>>) -> Self {
        let handle = Arc::new(Notify::new());
        *slot.lock() = Some(Arc::clone(&handle));
        Self { slot, handle }
    }
}

impl Drop for OutstandingRequest<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        if slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &self.handle))
        {
            *slot = None;
        }
    }
}

pub struct MessageDeliverySession {
    transport: Arc<dyn MessageTransport>,
    classifier: LongPollErrorClassifier,
    outstanding: Mutex<Option<Arc<Notify>>>,
}

impl std::fmt::Debug for MessageDeliverySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDeliverySession")
            .field("classifier", &self.classifier)
            .field("has_outstanding_request", &self.has_outstanding_request())
            .finish()
    }
}

impl MessageDeliverySession {
    /// Create a session over an existing transport.
    ///
    /// Markers and the quick-response threshold are fixed at construction.
    pub fn new(transport: Arc<dyn MessageTransport>, config: &MessageDeliveryConfig) -> Self {
        Self {
            transport,
            classifier: LongPollErrorClassifier::new(
                config.expected_errors.clone(),
                config.quick_response_threshold(),
            ),
            outstanding: Mutex::new(None),
        }
    }

    /// Create a session backed by [`HttpTransport`]
    pub fn from_config(config: &MessageDeliveryConfig) -> MessagingResult<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn with_classifier(mut self, classifier: LongPollErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn classifier(&self) -> &LongPollErrorClassifier {
        &self.classifier
    }

    /// Whether a remote call is currently registered as in flight
    pub fn has_outstanding_request(&self) -> bool {
        self.outstanding.lock().is_some()
    }

    async fn send_request(
        &self,
        operation: &'static str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, SendFailure> {
        let registration = OutstandingRequest::register(&self.outstanding);
        let cancelled = Arc::clone(&registration.handle);

        // A stop() issued before this point leaves a permit, so notified() resolves at once
        let result = tokio::select! {
            biased;
            _ = cancelled.notified() => Err(SendFailure::Cancelled),
            response = self.transport.call(operation, body) => response.map_err(SendFailure::Transport),
        };

        drop(registration);
        result
    }

    fn encode<T: Serialize>(operation: &'static str, request: &T) -> MessagingResult<serde_json::Value> {
        serde_json::to_value(request)
            .map_err(|e| MessagingError::serialization(operation, e.to_string()))
    }

    /// Send a short RPC; failures are always surfaced
    async fn call<T: Serialize>(
        &self,
        operation: &'static str,
        message_id: &str,
        request: &T,
    ) -> MessagingResult<()> {
        let body = Self::encode(operation, request)?;
        let started = Instant::now();

        match self.send_request(operation, body).await {
            Ok(_) => {
                log_message_operation(
                    operation,
                    Some(message_id),
                    "success",
                    Some(started.elapsed().as_millis() as u64),
                    None,
                );
                Ok(())
            }
            Err(SendFailure::Cancelled) => {
                warn!(operation = operation, message_id = %message_id, "Request cancelled");
                Err(MessagingError::cancelled(operation))
            }
            Err(SendFailure::Transport(e)) => {
                error!(
                    operation = operation,
                    message_id = %message_id,
                    error = %e,
                    "Message delivery request failed"
                );
                Err(MessagingError::transport(operation, e.to_string()))
            }
        }
    }
}

#[async_trait]
impl MessageDeliveryService for MessageDeliverySession {
    async fn get_messages(&self, instance_id: &str) -> MessagingResult<GetMessagesOutput> {
        let operation = operations::GET_MESSAGES;
        let request = GetMessagesRequest::new(instance_id);
        debug!(
            destination = %request.destination,
            messages_request_id = %request.messages_request_id,
            "Polling for messages"
        );
        let body = Self::encode(operation, &request)?;

        let requested_at = Instant::now();
        let response = self.send_request(operation, body).await;
        let responded_at = Instant::now();

        match response {
            Ok(value) if value.is_null() => Ok(GetMessagesOutput::default()),
            Ok(value) => {
                let output: GetMessagesOutput = serde_json::from_value(value)
                    .map_err(|e| MessagingError::transport(operation, e.to_string()))?;
                log_message_operation(
                    operation,
                    None,
                    "success",
                    Some(responded_at.duration_since(requested_at).as_millis() as u64),
                    Some(&format!("{} message(s)", output.messages.len())),
                );
                Ok(output)
            }
            Err(SendFailure::Cancelled) => {
                debug!(destination = %instance_id, "Long poll cancelled");
                Err(MessagingError::cancelled(operation))
            }
            Err(SendFailure::Transport(e)) => {
                let text = e.to_string();
                let classification = self
                    .classifier
                    .classify(&text, responded_at.duration_since(requested_at));

                if classification.is_unexpected() {
                    error!(
                        destination = %instance_id,
                        classification = ?classification,
                        error = %text,
                        "Unexpected error while polling for messages"
                    );
                    Err(MessagingError::transport(operation, text))
                } else {
                    debug!(
                        destination = %instance_id,
                        classification = ?classification,
                        error = %text,
                        "Long poll ended by expected disconnect"
                    );
                    Ok(GetMessagesOutput::default())
                }
            }
        }
    }

    async fn acknowledge_message(&self, message_id: &str) -> MessagingResult<()> {
        let request = AcknowledgeMessageRequest {
            message_id: message_id.to_string(),
        };
        self.call(operations::ACKNOWLEDGE_MESSAGE, message_id, &request)
            .await
    }

    async fn send_reply(&self, message_id: &str, payload: &str) -> MessagingResult<()> {
        let request = SendReplyRequest::new(message_id, payload);
        self.call(operations::SEND_REPLY, message_id, &request).await
    }

    async fn fail_message(
        &self,
        message_id: &str,
        failure_type: FailureType,
    ) -> MessagingResult<()> {
        let request = FailMessageRequest {
            message_id: message_id.to_string(),
            failure_type,
        };
        self.call(operations::FAIL_MESSAGE, message_id, &request)
            .await
    }

    async fn delete_message(&self, message_id: &str) -> MessagingResult<()> {
        let request = DeleteMessageRequest {
            message_id: message_id.to_string(),
        };
        self.call(operations::DELETE_MESSAGE, message_id, &request)
            .await
    }

    fn stop(&self) {
        if let Some(handle) = self.outstanding.lock().as_ref() {
            debug!(
                target_service = delivery::SERVICE_TARGET_PREFIX,
                "Cancelling outstanding request"
            );
            handle.notify_one();
        }
    }
}
