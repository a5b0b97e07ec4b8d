#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Instance Agent Core
//!
//! Instance-side agent logic for remotely managed nodes.
//!
//! ## Overview
//!
//! The crate covers two subsystems:
//!
//! - **Association refresh**: reconciles the locally cached view of
//!   associations (recurring, remotely managed task assignments) against the
//!   authoritative directory and forces requested associations to run now.
//! - **Message delivery**: a long-poll session against the command delivery
//!   queue with cancellable in-flight requests and classification of expected
//!   versus unexpected network failures.
//!
//! Plugin execution, storage upload and the directory service itself are host
//! concerns, modeled as collaborator traits in [`association`].
//!
//! ## Module Organization
//!
//! - [`association`] - Association model, status vocabulary and collaborator traits
//! - [`processor`] - Refresh-association processor and plugin output records
//! - [`messaging`] - Message delivery session, transport and poll loop
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use instance_agent::config::AgentConfig;
//! use instance_agent::messaging::{MessageDeliveryService, MessageDeliverySession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! instance_agent::logging::init_structured_logging();
//!
//! let config = AgentConfig::from_env()?;
//! let session = MessageDeliverySession::from_config(&config.message_delivery)?;
//!
//! let output = session.get_messages("i-0123456789abcdef0").await?;
//! for message in &output.messages {
//!     println!("received {:?} on {:?}", message.message_id, message.topic);
//! }
//! # Ok(())
//! # }
//! ```

pub mod association;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod processor;

pub use association::{
    AssociationCache, AssociationStatus, InstanceAssociation, NotifyExecutionSignal,
    ScheduleExpressionEvaluator,
};
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use messaging::{
    MessageDeliveryService, MessageDeliverySession, MessagePoller, MessagingError,
    MessagingResult,
};
pub use processor::{PluginResult, RefreshCollaborators, RefreshProcessor, RefreshResult};
