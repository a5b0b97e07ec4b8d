//! # System Constants
//!
//! Fixed values shared by the association processor and the message delivery
//! session: canonical status messages, wire-level defaults and the default
//! expected-error markers used by long-poll classification.

use std::time::Duration;

/// Association status messages reported to the directory
pub mod messages {
    /// Message attached to every transition to `Pending`
    pub const ASSOCIATION_PENDING: &str =
        "Association is pending, waiting for the next scheduled execution";

    pub const ALL_ASSOCIATIONS_REQUESTED: &str =
        "All associations have been requested to execute immediately";

    pub const ORCHESTRATION_DIR_CREATE_FAILED: &str =
        "Failed to create orchestrationDir directory for log files";

    /// Informational line naming the explicitly requested associations
    pub fn associations_requested(ids: &[String]) -> String {
        format!("Associations {ids:?} have been requested to execute immediately")
    }
}

/// Message delivery wire defaults
pub mod delivery {
    use super::Duration;

    /// How long retrieved messages stay hidden from other consumers
    pub const VISIBILITY_TIMEOUT_SECONDS: i64 = 10;

    /// Failures returning faster than this are never treated as long-poll artifacts
    pub const QUICK_RESPONSE_THRESHOLD: Duration = Duration::from_secs(10);

    pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 60_000;

    pub const SERVICE_TARGET_PREFIX: &str = "EC2MessageDeliveryService";

    /// Host prefix of the regional default endpoint
    pub const SERVICE_ENDPOINT_PREFIX: &str = "ec2messages";
    pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

    /// Remote operation names
    pub mod operations {
        pub const GET_MESSAGES: &str = "GetMessages";
        pub const ACKNOWLEDGE_MESSAGE: &str = "AcknowledgeMessage";
        pub const SEND_REPLY: &str = "SendReply";
        pub const FAIL_MESSAGE: &str = "FailMessage";
        pub const DELETE_MESSAGE: &str = "DeleteMessage";
    }
}

/// Default expected-error markers for long-poll classification
pub mod markers {
    /// Remote side closed or reset an idle connection.
    ///
    /// Matched case-insensitively; the OS reports resets as "Connection reset
    /// by peer" and hyper reports a clean close mid-request as "connection
    /// closed before message completed".
    pub const SERVER_BASED: &[&str] = &[
        "use of closed network connection",
        "connection reset by peer",
        "connection closed before message completed",
    ];

    /// Local HTTP client gave up waiting for response headers
    pub const CLIENT_BASED: &[&str] = &[
        "Client.Timeout exceeded while awaiting headers",
        "operation timed out",
    ];
}

/// Plugin output defaults
pub mod plugin {
    pub const STDOUT_FILE_NAME: &str = "stdout";
    pub const STDERR_FILE_NAME: &str = "stderr";
    pub const MAX_STDOUT_LENGTH: usize = 24_000;
    pub const MAX_STDERR_LENGTH: usize = 8_000;
    pub const OUTPUT_TRUNCATED_SUFFIX: &str = "--output truncated--";
}
