//! # Instance Association Model
//!
//! In-memory view of one association bound to this instance for a single
//! refresh cycle. Records are built from a directory listing, filled in by
//! detail loading and expression parsing, and dropped at the end of the cycle.

use super::expression::ScheduleExpression;
use super::status::AssociationStatus;
use crate::error::{AgentError, AgentResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Association summary as returned by the directory listing.
///
/// Every field is optional because the remote listing may return partially
/// populated records; use the guarded accessors on [`InstanceAssociation`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssociationSummary {
    pub association_id: Option<String>,
    pub name: Option<String>,
    pub instance_id: Option<String>,
    /// Fingerprint of the association document, used for cache staleness
    pub checksum: Option<String>,
    pub document_version: Option<String>,
    pub schedule_expression: Option<String>,
    pub detailed_status: Option<AssociationStatus>,
    pub last_execution_date: Option<DateTime<Utc>>,
}

/// Full association content, populated by the directory loader
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationDetail {
    /// Raw command document; its content is opaque to this crate
    pub document: Option<String>,
    pub schedule_expression: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InstanceAssociation {
    pub association: AssociationSummary,
    pub detail: Option<AssociationDetail>,
    /// Parsed schedule, set by the expression evaluator
    pub expression: Option<ScheduleExpression>,
    pub next_run: Option<DateTime<Utc>>,
    /// Errors collected while processing this association in the current cycle
    pub errors: Vec<AgentError>,
}

impl InstanceAssociation {
    pub fn new(association: AssociationSummary) -> Self {
        Self {
            association,
            ..Default::default()
        }
    }

    pub fn association_id(&self) -> AgentResult<&str> {
        self.association
            .association_id
            .as_deref()
            .ok_or(AgentError::MissingField {
                field: "association_id",
            })
    }

    pub fn name(&self) -> AgentResult<&str> {
        self.association
            .name
            .as_deref()
            .ok_or(AgentError::MissingField { field: "name" })
    }

    pub fn instance_id(&self) -> AgentResult<&str> {
        self.association
            .instance_id
            .as_deref()
            .ok_or(AgentError::MissingField {
                field: "instance_id",
            })
    }

    pub fn detailed_status(&self) -> Option<AssociationStatus> {
        self.association.detailed_status
    }

    pub fn set_detailed_status(&mut self, status: AssociationStatus) {
        self.association.detailed_status = Some(status);
    }

    /// The schedule expression, preferring the loaded detail over the listing
    pub fn schedule_expression(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(|d| d.schedule_expression.as_deref())
            .or(self.association.schedule_expression.as_deref())
            .filter(|expr| !expr.trim().is_empty())
    }

    /// Associations without a recurrence run once and skip expression evaluation
    pub fn is_run_once(&self) -> bool {
        self.schedule_expression().is_none()
    }

    pub fn is_detail_loaded(&self) -> bool {
        self.detail.is_some()
    }

    pub fn record_error(&mut self, error: AgentError) {
        self.errors.push(error);
    }

    /// Identifier for log lines; never fails
    pub fn display_id(&self) -> &str {
        self.association
            .association_id
            .as_deref()
            .unwrap_or("<unknown>")
    }
}
