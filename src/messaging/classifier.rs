//! # Long-Poll Error Classification
//!
//! Decides whether a failed `GetMessages` call is a routine long-poll artifact
//! or a genuine failure.
//!
//! The same error text can mean either, depending on timing:
//!
//! ```text
//! elapsed < threshold ──────────────────────────────▶ QuickFailure  (unexpected)
//! elapsed ≥ threshold ─┬─ server marker in text ───▶ ServerDisconnect (expected)
//!                      ├─ client marker in text ───▶ ClientTimeout    (expected)
//!                      └─ otherwise ───────────────▶ Unrecognized     (unexpected)
//! ```
//!
//! Markers match case-insensitively.

use crate::config::ExpectedErrorMarkers;
use crate::constants::delivery::QUICK_RESPONSE_THRESHOLD;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClassification {
    /// Failed faster than any long-poll window would explain
    QuickFailure,
    /// The remote side closed an idle connection
    ServerDisconnect,
    /// The local client timed out waiting for the response
    ClientTimeout,
    /// Slow failure without a known marker
    Unrecognized,
}

impl ErrorClassification {
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::QuickFailure | Self::Unrecognized)
    }
}

#[derive(Debug, Clone)]
pub struct LongPollErrorClassifier {
    server_based: Vec<String>,
    client_based: Vec<String>,
    quick_response_threshold: Duration,
}

impl Default for LongPollErrorClassifier {
    fn default() -> Self {
        Self::new(ExpectedErrorMarkers::default(), QUICK_RESPONSE_THRESHOLD)
    }
}

impl LongPollErrorClassifier {
    /// Empty markers are dropped; they would match every error text.
    pub fn new(markers: ExpectedErrorMarkers, quick_response_threshold: Duration) -> Self {
        let keep = |list: Vec<String>| -> Vec<String> {
            list.into_iter()
                .filter(|m| !m.is_empty())
                .map(|m| m.to_lowercase())
                .collect()
        };
        Self {
            server_based: keep(markers.server_based),
            client_based: keep(markers.client_based),
            quick_response_threshold,
        }
    }

    pub fn quick_response_threshold(&self) -> Duration {
        self.quick_response_threshold
    }

    pub fn classify(&self, error: &str, elapsed: Duration) -> ErrorClassification {
        if elapsed < self.quick_response_threshold {
            return ErrorClassification::QuickFailure;
        }

        if self.is_server_based_error(error) {
            debug!(
                elapsed_secs = elapsed.as_secs_f64(),
                "Server terminated connection - expected for long polling calls"
            );
            ErrorClassification::ServerDisconnect
        } else if self.is_client_based_error(error) {
            debug!(
                elapsed_secs = elapsed.as_secs_f64(),
                "Client terminated connection - expected for long polling calls"
            );
            ErrorClassification::ClientTimeout
        } else {
            ErrorClassification::Unrecognized
        }
    }

    /// Whether a failure observed between `requested_at` and `responded_at` must surface
    pub fn is_error_unexpected(
        &self,
        error: &str,
        requested_at: Instant,
        responded_at: Instant,
    ) -> bool {
        let elapsed = responded_at.saturating_duration_since(requested_at);
        self.classify(error, elapsed).is_unexpected()
    }

    pub fn is_server_based_error(&self, message: &str) -> bool {
        contains_any(&message.to_lowercase(), &self.server_based)
    }

    pub fn is_client_based_error(&self, message: &str) -> bool {
        contains_any(&message.to_lowercase(), &self.client_based)
    }
}

fn contains_any(message: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| message.contains(m.as_str()))
}
