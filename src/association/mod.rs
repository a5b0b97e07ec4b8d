//! # Associations
//!
//! Data model, status vocabulary and collaborator contracts for associations:
//! recurring, remotely managed task assignments bound to this instance.

pub mod cache;
pub mod collaborators;
pub mod expression;
pub mod model;
pub mod signal;
pub mod status;

pub use cache::{AssociationCache, CachedDetail};
pub use collaborators::{
    AssociationDirectory, CacheValidator, ExecutionSignal, ExpressionEvaluator, InstanceIdentity,
    NoopUploader, OutputUploader, ScheduleManager, UploadRequest,
};
pub use expression::{ScheduleExpression, ScheduleExpressionEvaluator};
pub use model::{AssociationDetail, AssociationSummary, InstanceAssociation};
pub use signal::NotifyExecutionSignal;
pub use status::{AssociationErrorCode, AssociationStatus, StatusUpdate};
