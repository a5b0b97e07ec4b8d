//! # Association Status
//!
//! Lifecycle states, error codes and the status update record sent to the
//! association directory.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detailed lifecycle status of an association on this instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationStatus {
    /// Queued for immediate execution by the schedule manager
    Pending,
    /// Currently executing
    InProgress,
    Success,
    Failed,
}

impl AssociationStatus {
    /// Pending or InProgress work must not be queued again
    pub fn is_queued_or_running(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Success => "Success",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for AssociationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssociationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "InProgress" => Ok(Self::InProgress),
            "Success" => Ok(Self::Success),
            "Failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid association status: {s}")),
        }
    }
}

/// Reason attached to a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationErrorCode {
    /// Association detail could not be listed or loaded
    #[serde(rename = "ListAssociationError")]
    ListAssociationError,
    /// Schedule expression could not be parsed
    #[serde(rename = "InvalidExpression")]
    InvalidExpression,
    #[serde(rename = "")]
    NoError,
}

impl AssociationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListAssociationError => "ListAssociationError",
            Self::InvalidExpression => "InvalidExpression",
            Self::NoError => "",
        }
    }
}

impl fmt::Display for AssociationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single status transition reported to the association directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusUpdate {
    pub association_id: String,
    pub name: String,
    pub instance_id: String,
    pub status: AssociationStatus,
    pub error_code: AssociationErrorCode,
    /// ISO-8601 UTC, millisecond precision
    pub execution_date: String,
    pub message: String,
    pub output_url: Option<String>,
}

impl StatusUpdate {
    pub fn new(
        association_id: impl Into<String>,
        name: impl Into<String>,
        instance_id: impl Into<String>,
        status: AssociationStatus,
        error_code: AssociationErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            association_id: association_id.into(),
            name: name.into(),
            instance_id: instance_id.into(),
            status,
            error_code,
            execution_date: to_iso8601_utc(Utc::now()),
            message: message.into(),
            output_url: None,
        }
    }

    pub fn with_output_url(mut self, url: impl Into<String>) -> Self {
        self.output_url = Some(url.into());
        self
    }
}

pub fn to_iso8601_utc(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_queued_or_running() {
        assert!(AssociationStatus::Pending.is_queued_or_running());
        assert!(AssociationStatus::InProgress.is_queued_or_running());
        assert!(!AssociationStatus::Success.is_queued_or_running());
        assert!(!AssociationStatus::Failed.is_queued_or_running());
        assert!(AssociationStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_string_conversion() {
        assert_eq!(AssociationStatus::InProgress.to_string(), "InProgress");
        assert_eq!(
            "Failed".parse::<AssociationStatus>().unwrap(),
            AssociationStatus::Failed
        );
        assert!("failed".parse::<AssociationStatus>().is_err());
    }

    #[test]
    fn test_error_code_wire_values() {
        assert_eq!(
            serde_json::to_string(&AssociationErrorCode::ListAssociationError).unwrap(),
            "\"ListAssociationError\""
        );
        assert_eq!(
            serde_json::to_string(&AssociationErrorCode::NoError).unwrap(),
            "\"\""
        );
    }

    #[test]
    fn test_status_update_wire_shape() {
        let update = StatusUpdate::new(
            "assoc-1",
            "AWS-UpdateSSMAgent",
            "i-0123456789abcdef0",
            AssociationStatus::Pending,
            AssociationErrorCode::NoError,
            "queued",
        )
        .with_output_url("s3://agent-output/assoc-1");

        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["AssociationId"], "assoc-1");
        assert_eq!(value["Status"], "Pending");
        assert_eq!(value["ErrorCode"], "");
        assert_eq!(value["OutputUrl"], "s3://agent-output/assoc-1");
        assert!(value["ExecutionDate"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_iso8601_formatting() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(to_iso8601_utc(time), "2024-03-09T07:05:01.000Z");
    }
}
