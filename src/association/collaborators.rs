//! # Association Collaborators
//!
//! Capability traits for everything the refresh processor calls into but does
//! not own: instance identity, the association directory service, the local
//! cache, expression evaluation, scheduling, the execution wake-up signal and
//! the output upload sink. Production implementations live with the host
//! agent; tests substitute recording doubles.

use super::model::InstanceAssociation;
use super::status::StatusUpdate;
use crate::error::{AgentError, AgentResult};
use async_trait::async_trait;
use std::path::Path;

/// Resolves the identity of the instance this agent runs on
#[async_trait]
pub trait InstanceIdentity: Send + Sync {
    async fn instance_id(&self) -> AgentResult<String>;
}

/// Authoritative directory of associations bound to an instance
#[async_trait]
pub trait AssociationDirectory: Send + Sync {
    /// List every association currently bound to the instance
    async fn list(&self, instance_id: &str) -> AgentResult<Vec<InstanceAssociation>>;

    /// Populate the association's detail in place, from cache or from the service
    async fn load_detail(&self, association: &mut InstanceAssociation) -> AgentResult<()>;

    /// Report a status transition for one association
    async fn update_status(&self, update: StatusUpdate) -> AgentResult<()>;
}

/// Evicts cached association detail that no longer matches the listing
pub trait CacheValidator: Send + Sync {
    fn validate(&self, association: &InstanceAssociation);
}

/// Parses an association's schedule expression
pub trait ExpressionEvaluator: Send + Sync {
    fn parse(&self, association: &mut InstanceAssociation) -> AgentResult<()>;
}

/// Receives the refreshed association list for scheduling
pub trait ScheduleManager: Send + Sync {
    fn refresh(&self, associations: &[InstanceAssociation]);
}

/// Wakes the execution loop so it picks up newly pending work
pub trait ExecutionSignal: Send + Sync {
    fn execute(&self);
}

/// Plugin output to be uploaded to external storage
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    pub plugin_id: &'a str,
    pub orchestration_dir: &'a Path,
    pub bucket_name: Option<&'a str>,
    pub key_prefix: Option<&'a str>,
    pub stdout: &'a str,
    pub stderr: &'a str,
}

/// Upload sink for plugin stdout/stderr; failures are advisory
#[async_trait]
pub trait OutputUploader: Send + Sync {
    async fn upload(&self, request: UploadRequest<'_>) -> Vec<AgentError>;
}

/// Uploader used when no output destination is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUploader;

#[async_trait]
impl OutputUploader for NoopUploader {
    async fn upload(&self, _request: UploadRequest<'_>) -> Vec<AgentError> {
        Vec::new()
    }
}
