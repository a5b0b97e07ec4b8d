//! # Plugin Output
//!
//! The aggregate result of one refresh invocation and the plugin result
//! record handed back to the caller.

use crate::error::AgentError;
use serde::{Deserialize, Serialize};
use std::fmt;

const ERROR_SEPARATOR: &str = "\n----------ERROR-------\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    #[default]
    NotStarted,
    Success,
    Failed,
}

/// Outcome of a refresh invocation: status, exit code and narrative text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefreshResult {
    pub exit_code: i32,
    pub status: ResultStatus,
    pub stdout: String,
    pub stderr: String,
}

impl RefreshResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_as_succeeded(&mut self) {
        self.exit_code = 0;
        self.status = ResultStatus::Success;
    }

    pub fn mark_as_failed(&mut self, error: &AgentError) {
        self.exit_code = 1;
        self.status = ResultStatus::Failed;
        self.append_error(&error.to_string());
    }

    pub fn append_info(&mut self, message: &str) {
        append_line(&mut self.stdout, message);
    }

    pub fn append_error(&mut self, message: &str) {
        append_line(&mut self.stderr, message);
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == ResultStatus::Failed
    }
}

fn append_line(buffer: &mut String, message: &str) {
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(message);
}

impl fmt::Display for RefreshResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stdout)?;
        if !self.stderr.is_empty() {
            f.write_str(ERROR_SEPARATOR)?;
            f.write_str(&self.stderr)?;
        }
        Ok(())
    }
}

/// Plugin result record shared with the caller.
///
/// On input, `output` carries the requested association-id list; after
/// processing it holds the rendered result narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginResult {
    #[serde(rename = "PluginID")]
    pub plugin_id: String,
    pub output: serde_json::Value,
    pub output_s3_bucket_name: Option<String>,
    pub output_s3_key_prefix: Option<String>,
    pub code: i32,
    pub status: ResultStatus,
    pub standard_output: String,
    pub standard_error: String,
}

impl PluginResult {
    pub fn new(plugin_id: impl Into<String>, output: serde_json::Value) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            output,
            ..Default::default()
        }
    }
}

/// Truncate `input` to at most `max_length` bytes (on a char boundary),
/// appending `suffix` when anything was cut
pub fn string_prefix(input: &str, max_length: usize, suffix: &str) -> String {
    if input.len() <= max_length {
        return input.to_string();
    }
    let mut end = max_length;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &input[..end], suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_as_failed_appends_error() {
        let mut result = RefreshResult::new();
        result.mark_as_succeeded();
        result.append_info("first");
        result.mark_as_failed(&AgentError::other("boom"));

        assert!(result.is_failed());
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stdout, "first");
        assert_eq!(result.stderr, "boom");
        assert_eq!(result.to_string(), "first\n----------ERROR-------\nboom");
    }

    #[test]
    fn test_display_without_errors_is_stdout() {
        let mut result = RefreshResult::new();
        result.append_info("a");
        result.append_info("b");
        assert_eq!(result.to_string(), "a\nb");
    }

    #[test]
    fn test_string_prefix() {
        assert_eq!(string_prefix("short", 10, "--cut--"), "short");
        assert_eq!(string_prefix("abcdefgh", 3, "..."), "abc...");
        // never splits a multi-byte character
        assert_eq!(string_prefix("héllo", 2, "~"), "h~");
    }
}
