//! # Messaging Module
//!
//! Long-poll client for the message delivery queue: wire types, the HTTP
//! transport, error classification, the cancellable session and the poll loop.

pub mod classifier;
pub mod errors;
pub mod message;
pub mod poller;
pub mod session;
pub mod transport;

pub use classifier::{ErrorClassification, LongPollErrorClassifier};
pub use errors::{MessagingError, MessagingResult, TransportError};
pub use message::*;
pub use poller::{HandlerError, HandlerOutcome, MessageDisposition, MessageHandler, MessagePoller};
pub use session::{MessageDeliveryService, MessageDeliverySession};
pub use transport::{error_chain, HttpTransport, MessageTransport};
