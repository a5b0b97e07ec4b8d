//! # Agent Configuration
//!
//! Settings for the message delivery session, plugin output handling and the
//! poll loop. Values come from defaults, an optional configuration file and
//! `AGENT_*` environment variables, in that order of precedence.

use crate::constants::{delivery, markers, plugin};
use crate::error::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub message_delivery: MessageDeliveryConfig,
    pub plugin_output: PluginOutputConfig,
    pub poller: PollerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageDeliveryConfig {
    /// Service endpoint, e.g. `https://ec2messages.us-east-1.amazonaws.com`
    pub endpoint: String,
    /// Region used to derive the default endpoint when `endpoint` is empty
    pub region: Option<String>,
    /// Connect and overall request timeout for the HTTP client
    pub connection_timeout_ms: u64,
    pub quick_response_threshold_seconds: u64,
    pub expected_errors: ExpectedErrorMarkers,
    pub user_agent: String,
}

impl Default for MessageDeliveryConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: None,
            connection_timeout_ms: delivery::DEFAULT_CONNECTION_TIMEOUT_MS,
            quick_response_threshold_seconds: delivery::QUICK_RESPONSE_THRESHOLD.as_secs(),
            expected_errors: ExpectedErrorMarkers::default(),
            user_agent: format!("instance-agent/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MessageDeliveryConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn quick_response_threshold(&self) -> Duration {
        Duration::from_secs(self.quick_response_threshold_seconds)
    }

    /// The configured endpoint, or the regional default when only a region is set
    pub fn service_endpoint(&self) -> Option<String> {
        let endpoint = self.endpoint.trim();
        if !endpoint.is_empty() {
            return Some(endpoint.to_string());
        }

        let region = self.region.as_deref().map(str::trim).filter(|r| !r.is_empty())?;
        let domain = if region.starts_with("cn-") {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        };
        Some(format!(
            "https://{}.{region}.{domain}",
            delivery::SERVICE_ENDPOINT_PREFIX
        ))
    }
}

/// Error-text markers that identify benign long-poll disconnects.
///
/// Built once and handed to the session at construction; the session never
/// mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedErrorMarkers {
    /// The remote side dropped an idle connection
    pub server_based: Vec<String>,
    /// The local transport timed out waiting for the response
    pub client_based: Vec<String>,
}

impl Default for ExpectedErrorMarkers {
    fn default() -> Self {
        Self {
            server_based: markers::SERVER_BASED.iter().map(|m| m.to_string()).collect(),
            client_based: markers::CLIENT_BASED.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOutputConfig {
    pub stdout_file_name: String,
    pub stderr_file_name: String,
    pub max_stdout_length: usize,
    pub max_stderr_length: usize,
    pub output_truncated_suffix: String,
}

impl Default for PluginOutputConfig {
    fn default() -> Self {
        Self {
            stdout_file_name: plugin::STDOUT_FILE_NAME.to_string(),
            stderr_file_name: plugin::STDERR_FILE_NAME.to_string(),
            max_stdout_length: plugin::MAX_STDOUT_LENGTH,
            max_stderr_length: plugin::MAX_STDERR_LENGTH,
            output_truncated_suffix: plugin::OUTPUT_TRUNCATED_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Pause after an unexpected retrieval failure before polling again
    pub error_backoff_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            error_backoff_ms: 5_000,
        }
    }
}

impl PollerConfig {
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }
}

impl AgentConfig {
    /// Build configuration from defaults overridden by individual environment variables
    pub fn from_env() -> AgentResult<Self> {
        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("AGENT_MDS_ENDPOINT") {
            config.message_delivery.endpoint = endpoint;
        }

        if let Ok(region) = std::env::var("AGENT_MDS_REGION") {
            config.message_delivery.region = Some(region);
        }

        if let Ok(timeout) = std::env::var("AGENT_MDS_CONNECTION_TIMEOUT_MS") {
            config.message_delivery.connection_timeout_ms = timeout.parse().map_err(|e| {
                AgentError::configuration(format!("Invalid connection_timeout_ms: {e}"))
            })?;
        }

        if let Ok(backoff) = std::env::var("AGENT_POLLER_ERROR_BACKOFF_MS") {
            config.poller.error_backoff_ms = backoff.parse().map_err(|e| {
                AgentError::configuration(format!("Invalid error_backoff_ms: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load an optional configuration file layered under `AGENT__*` environment variables
    ///
    /// Nested keys use a double underscore, e.g.
    /// `AGENT__MESSAGE_DELIVERY__ENDPOINT`.
    pub fn load(path: Option<&Path>) -> AgentResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let config: AgentConfig = builder
            .add_source(
                config::Environment::with_prefix("AGENT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AgentResult<()> {
        let delivery = &self.message_delivery;
        if delivery.connection_timeout_ms == 0 {
            return Err(AgentError::configuration(
                "message_delivery.connection_timeout_ms must be greater than zero",
            ));
        }
        if self.plugin_output.stdout_file_name.is_empty()
            || self.plugin_output.stderr_file_name.is_empty()
        {
            return Err(AgentError::configuration(
                "plugin_output file names must not be empty",
            ));
        }
        Ok(())
    }
}
