//! # Refresh Association Processor
//!
//! Forces associations bound to this instance to run now.
//!
//! ## Overview
//!
//! A "refresh association" plugin run arrives twice. The first invocation
//! (`apply == false`) only acknowledges the request. The second
//! (`apply == true`) reconciles the local view against the association
//! directory, moves the requested associations to `Pending`, hands the
//! refreshed list to the schedule manager and wakes the execution loop.
//!
//! ## Failure handling
//!
//! - Instance identity and directory listing failures abort the cycle before
//!   any association is touched.
//! - Detail-load and expression failures are isolated to the one association:
//!   it is reported `Failed`, excluded from scheduling, and the batch goes on.
//! - Orchestration directory, file write and upload failures are advisory.

use crate::association::{
    AssociationDirectory, AssociationErrorCode, AssociationStatus, CacheValidator,
    ExecutionSignal, ExpressionEvaluator, InstanceAssociation, InstanceIdentity, OutputUploader,
    ScheduleManager, StatusUpdate, UploadRequest,
};
use crate::config::PluginOutputConfig;
use crate::constants::messages;
use crate::error::{AgentError, AgentResult};
use crate::logging::log_association_operation;
use crate::processor::output::{string_prefix, PluginResult, RefreshResult, ResultStatus};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything the processor calls into
#[derive(Clone)]
pub struct RefreshCollaborators {
    pub identity: Arc<dyn InstanceIdentity>,
    pub directory: Arc<dyn AssociationDirectory>,
    pub cache: Arc<dyn CacheValidator>,
    pub evaluator: Arc<dyn ExpressionEvaluator>,
    pub schedule_manager: Arc<dyn ScheduleManager>,
    pub signal: Arc<dyn ExecutionSignal>,
    pub uploader: Arc<dyn OutputUploader>,
}

pub struct RefreshProcessor {
    collaborators: RefreshCollaborators,
    output_config: PluginOutputConfig,
}

impl RefreshProcessor {
    pub fn new(collaborators: RefreshCollaborators, output_config: PluginOutputConfig) -> Self {
        Self {
            collaborators,
            output_config,
        }
    }

    /// Process a refresh-association plugin run and fill in `plugin_result`
    ///
    /// `plugin_result.output` must hold the requested association ids as a
    /// JSON string array (or null for "all associations").
    pub async fn process_refresh_association(
        &self,
        plugin_result: &mut PluginResult,
        orchestration_dir: &Path,
        apply: bool,
    ) -> RefreshResult {
        let mut out = RefreshResult::new();

        match parse_association_ids(&plugin_result.output) {
            Err(e) => {
                error!(error = %e, "Refresh association payload rejected");
                out.mark_as_failed(&e);
                if apply {
                    self.persist_output(plugin_result, orchestration_dir, &mut out)
                        .await;
                }
            }
            Ok(association_ids) if apply => {
                out = self.refresh_association(&association_ids).await;
                self.persist_output(plugin_result, orchestration_dir, &mut out)
                    .await;
            }
            Ok(association_ids) => {
                // The refresh itself happens on the follow-up run with apply set
                out.mark_as_succeeded();
                append_requested_message(&mut out, &association_ids);
            }
        }

        plugin_result.code = out.exit_code;
        plugin_result.status = ResultStatus::Success;
        plugin_result.output = serde_json::Value::String(out.to_string());
        plugin_result.standard_output = string_prefix(
            &out.stdout,
            self.output_config.max_stdout_length,
            &self.output_config.output_truncated_suffix,
        );
        plugin_result.standard_error = string_prefix(
            &out.stderr,
            self.output_config.max_stderr_length,
            &self.output_config.output_truncated_suffix,
        );

        out
    }

    /// Run the refresh cycle for the requested association ids
    pub async fn refresh_association(&self, association_ids: &[String]) -> RefreshResult {
        let mut out = RefreshResult::new();
        let c = &self.collaborators;

        let instance_id = match c.identity.instance_id().await {
            Ok(id) => id,
            Err(e) => {
                let err = AgentError::InstanceIdentity(format!("failed to load instance ID, {e}"));
                error!(error = %err, "Refresh association aborted");
                out.mark_as_failed(&err);
                return out;
            }
        };

        let mut associations = match c.directory.list(&instance_id).await {
            Ok(associations) => associations,
            Err(e) => {
                let err =
                    AgentError::other(format!("failed to list instance associations, {e}"));
                error!(instance_id = %instance_id, error = %err, "Refresh association aborted");
                out.mark_as_failed(&err);
                return out;
            }
        };

        info!(
            instance_id = %instance_id,
            association_count = associations.len(),
            "Refreshing instance associations"
        );

        // Evict stale cache entries before any detail is loaded
        for association in &associations {
            c.cache.validate(association);
        }

        let apply_all = is_apply_all(association_ids);

        out.mark_as_succeeded();

        for association in associations.iter_mut() {
            if let Err(e) = self
                .prepare_association(association, association_ids, apply_all)
                .await
            {
                error!(
                    association_id = %association.display_id(),
                    error = %e,
                    "Association excluded from this refresh"
                );
                out.mark_as_failed(&e);
            }
        }

        let schedulable: Vec<InstanceAssociation> = associations
            .into_iter()
            .filter(|association| association.errors.is_empty())
            .collect();
        c.schedule_manager.refresh(&schedulable);

        append_requested_message(&mut out, association_ids);

        c.signal.execute();

        out
    }

    /// Load, validate and, when requested, queue one association.
    ///
    /// An `Err` means the association was reported `Failed` (when possible)
    /// and must not be scheduled this cycle.
    async fn prepare_association(
        &self,
        association: &mut InstanceAssociation,
        association_ids: &[String],
        apply_all: bool,
    ) -> AgentResult<()> {
        let c = &self.collaborators;

        let association_id = match association.association_id() {
            Ok(id) => id.to_string(),
            Err(e) => {
                association.record_error(e.clone());
                return Err(e);
            }
        };

        if let Err(e) = c.directory.load_detail(association).await {
            let err = AgentError::other(format!(
                "Encountered error while loading association {association_id} contents, {e}"
            ));
            return Err(self
                .fail_association(association, AssociationErrorCode::ListAssociationError, err)
                .await);
        }

        if !association.is_run_once() {
            if let Err(e) = c.evaluator.parse(association) {
                let err = AgentError::other(format!(
                    "Encountered error while parsing expression for association {association_id}, {e}"
                ));
                return Err(self
                    .fail_association(association, AssociationErrorCode::InvalidExpression, err)
                    .await);
            }
        }

        if !(apply_all || is_association_qualified_to_run_now(association_ids, association)) {
            return Ok(());
        }

        // Already queued or running work is not queued again
        if association
            .detailed_status()
            .is_some_and(|status| status.is_queued_or_running())
        {
            debug!(
                association_id = %association_id,
                status = ?association.detailed_status(),
                "Association already pending or in progress"
            );
            return Ok(());
        }

        if let Err(e) = self
            .report_status(
                association,
                AssociationStatus::Pending,
                AssociationErrorCode::NoError,
                messages::ASSOCIATION_PENDING,
            )
            .await
        {
            warn!(association_id = %association_id, error = %e, "Failed to report pending status");
        }
        association.set_detailed_status(AssociationStatus::Pending);

        log_association_operation(
            "refresh",
            Some(&association_id),
            association.association.name.as_deref(),
            AssociationStatus::Pending.as_str(),
            None,
        );
        Ok(())
    }

    /// Record `error` on the association, report it `Failed` and hand the error back
    async fn fail_association(
        &self,
        association: &mut InstanceAssociation,
        code: AssociationErrorCode,
        error: AgentError,
    ) -> AgentError {
        association.record_error(error.clone());
        let message = error.to_string();
        if let Err(report_err) = self
            .report_status(association, AssociationStatus::Failed, code, &message)
            .await
        {
            warn!(
                association_id = %association.display_id(),
                error = %report_err,
                "Failed to report association failure"
            );
        }
        association.set_detailed_status(AssociationStatus::Failed);
        error
    }

    async fn report_status(
        &self,
        association: &InstanceAssociation,
        status: AssociationStatus,
        code: AssociationErrorCode,
        message: &str,
    ) -> AgentResult<()> {
        let update = StatusUpdate::new(
            association.association_id()?,
            association.name()?,
            association.instance_id()?,
            status,
            code,
            message,
        );
        self.collaborators.directory.update_status(update).await
    }

    /// Write stdout/stderr into the orchestration directory and upload them
    async fn persist_output(
        &self,
        plugin_result: &PluginResult,
        orchestration_dir: &Path,
        out: &mut RefreshResult,
    ) {
        match serde_json::to_string_pretty(&*out) {
            Ok(response) => debug!("Returning response:\n{}", response),
            Err(e) => warn!(error = %e, "Failed to serialize refresh result"),
        }

        let stdout_path = orchestration_dir.join(&self.output_config.stdout_file_name);
        let stderr_path = orchestration_dir.join(&self.output_config.stderr_file_name);
        debug!(
            stdout = %stdout_path.display(),
            stderr = %stderr_path.display(),
            "Plugin output file paths"
        );

        if let Err(e) = tokio::fs::create_dir_all(orchestration_dir).await {
            warn!(dir = %orchestration_dir.display(), error = %e, "Failed to create orchestration directory");
            out.append_error(messages::ORCHESTRATION_DIR_CREATE_FAILED);
        }
        if let Err(e) = write_output_file(&stdout_path, &out.stdout).await {
            error!(error = %e, "Failed to write stdout file");
        }
        if let Err(e) = write_output_file(&stderr_path, &out.stderr).await {
            error!(error = %e, "Failed to write stderr file");
        }

        let upload_errors = self
            .collaborators
            .uploader
            .upload(UploadRequest {
                plugin_id: &plugin_result.plugin_id,
                orchestration_dir,
                bucket_name: plugin_result.output_s3_bucket_name.as_deref(),
                key_prefix: plugin_result.output_s3_key_prefix.as_deref(),
                stdout: &out.stdout,
                stderr: &out.stderr,
            })
            .await;
        if !upload_errors.is_empty() {
            error!(errors = ?upload_errors, "Unable to upload the logs");
        }
    }
}

async fn write_output_file(path: &Path, content: &str) -> AgentResult<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AgentError::io(path.display().to_string(), e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| AgentError::io(path.display().to_string(), e.to_string()))?;
    }

    Ok(())
}

/// Decode the requested association ids; null means "all associations"
pub fn parse_association_ids(payload: &serde_json::Value) -> AgentResult<Vec<String>> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(payload.clone()).map_err(|e| {
        AgentError::InvalidPayload(format!("expected a list of association ids: {e}"))
    })
}

/// An empty list, or a list holding exactly one empty string, selects every association
pub fn is_apply_all(association_ids: &[String]) -> bool {
    match association_ids {
        [] => true,
        [only] => only.is_empty(),
        _ => false,
    }
}

/// Exact-match membership of the association's id in the requested list
pub fn is_association_qualified_to_run_now(
    association_ids: &[String],
    association: &InstanceAssociation,
) -> bool {
    let Ok(association_id) = association.association_id() else {
        return false;
    };
    association_ids.iter().any(|id| id == association_id)
}

fn append_requested_message(out: &mut RefreshResult, association_ids: &[String]) {
    if is_apply_all(association_ids) {
        out.append_info(messages::ALL_ASSOCIATIONS_REQUESTED);
    } else {
        out.append_info(&messages::associations_requested(association_ids));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::AssociationSummary;
    use serde_json::json;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn association(id: &str) -> InstanceAssociation {
        InstanceAssociation::new(AssociationSummary {
            association_id: Some(id.to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_apply_all_selector() {
        assert!(is_apply_all(&[]));
        assert!(is_apply_all(&ids(&[""])));
        assert!(!is_apply_all(&ids(&["assoc-1"])));
        assert!(!is_apply_all(&ids(&["", ""])));
        assert!(!is_apply_all(&ids(&["", "assoc-1"])));
    }

    #[test]
    fn test_qualified_to_run_now() {
        let assoc = association("assoc-42");
        assert!(is_association_qualified_to_run_now(&ids(&["assoc-1", "assoc-42"]), &assoc));
        assert!(!is_association_qualified_to_run_now(&ids(&["assoc-4"]), &assoc));
        assert!(!is_association_qualified_to_run_now(&[], &assoc));
        assert!(!is_association_qualified_to_run_now(
            &ids(&["assoc-42"]),
            &InstanceAssociation::default()
        ));
    }

    #[test]
    fn test_parse_association_ids() {
        assert_eq!(parse_association_ids(&json!(null)).unwrap(), Vec::<String>::new());
        assert_eq!(
            parse_association_ids(&json!(["a", "b"])).unwrap(),
            ids(&["a", "b"])
        );
        assert!(matches!(
            parse_association_ids(&json!({"ids": ["a"]})),
            Err(AgentError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_requested_message_variants() {
        let mut out = RefreshResult::new();
        append_requested_message(&mut out, &ids(&[""]));
        assert_eq!(out.stdout, messages::ALL_ASSOCIATIONS_REQUESTED);

        let mut out = RefreshResult::new();
        append_requested_message(&mut out, &ids(&["assoc-42"]));
        assert!(out.stdout.contains("assoc-42"));
    }
}
