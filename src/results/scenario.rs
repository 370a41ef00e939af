//! Scenario-level execution data: status, errors and counters
//!
//! A `ScenarioExecution` is either deserialized from the JSON report a
//! child process left behind, or synthesized by fallback reconstruction
//! when that report is unavailable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stats::{ExecTotalStats, TimeStats};

/// Scenario and campaign execution status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Success.
    #[serde(rename = "SUCCESS")]
    Success,
    /// Success with warnings.
    #[serde(rename = "WARNINGS")]
    Warnings,
    /// Failure.
    #[serde(rename = "FAIL")]
    Fail,
    /// Test skipped.
    #[serde(rename = "SKIPPED")]
    Skipped,
    /// Unknown status.
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Warnings => "WARNINGS",
            ExecutionStatus::Fail => "FAIL",
            ExecutionStatus::Skipped => "SKIPPED",
            ExecutionStatus::Unknown => "UNKNOWN",
        };
        f.write_str(text)
    }
}

/// One error (or warning) that occurred during a test.
///
/// Immutable once appended, except that its message may be extended by a
/// continuation line before the next error starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestError {
    /// Error message.
    pub message: String,
    /// Error type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Error location (script:line).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Known issue identifier, when the error tracks a registered issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Issue level deciding whether this counts as warning or error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    /// Link to the issue tracker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TestError {
    /// Create a plain error from its message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            location: None,
            id: None,
            level: None,
            url: None,
        }
    }

    /// Append a continuation line to the message, newline separated.
    pub fn extend_message(&mut self, line: &str) {
        self.message.push('\n');
        self.message.push_str(line);
    }
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Execution data for one scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioExecution {
    /// Scenario name.
    pub name: String,
    /// Execution status, as reported or synthesized.
    pub status: ExecutionStatus,
    /// Free-form scenario attributes (author, title, ...).
    pub attributes: BTreeMap<String, String>,
    /// Errors that occurred during the test.
    pub errors: Vec<TestError>,
    /// Warnings raised during the test.
    pub warnings: Vec<TestError>,
    /// Time statistics.
    pub time: TimeStats,
    /// Step statistics.
    pub steps: ExecTotalStats,
    /// Action statistics.
    pub actions: ExecTotalStats,
    /// Expected result statistics.
    pub results: ExecTotalStats,
}

impl ScenarioExecution {
    /// New empty execution for the given scenario name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Status derived from the errors and warnings collected so far.
    pub fn derived_status(&self) -> ExecutionStatus {
        if !self.errors.is_empty() {
            ExecutionStatus::Fail
        } else if !self.warnings.is_empty() {
            ExecutionStatus::Warnings
        } else {
            ExecutionStatus::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serde_names() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Warnings).unwrap(),
            "\"WARNINGS\""
        );
        let status: ExecutionStatus = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(status, ExecutionStatus::Fail);
    }

    #[test]
    fn extend_message_joins_with_newline() {
        let mut error = TestError::new("Boom");
        error.extend_message("  extra detail");
        assert_eq!(error.message, "Boom\n  extra detail");
    }

    #[test]
    fn derived_status_precedence() {
        let mut execution = ScenarioExecution::new("case");
        assert_eq!(execution.derived_status(), ExecutionStatus::Success);
        execution.warnings.push(TestError::new("careful"));
        assert_eq!(execution.derived_status(), ExecutionStatus::Warnings);
        execution.errors.push(TestError::new("broken"));
        assert_eq!(execution.derived_status(), ExecutionStatus::Fail);
    }
}
