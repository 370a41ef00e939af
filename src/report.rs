//! Report files
//!
//! Two formats live here: the per-case scenario report (JSON, written by
//! the child runner and read back by the campaign), and the campaign-level
//! JUnit report written to `<outdir>/campaign.xml` once all cases are done.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::results::{
    CampaignExecution, ExecTotalStats, ExecutionStatus, ScenarioExecution, TestError, TimeStats,
};

/// Scenario report file, as serialized by the scenario runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Execution status.
    pub status: ExecutionStatus,
    /// Free-form scenario attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Errors that occurred during the test.
    #[serde(default)]
    pub errors: Vec<TestError>,
    /// Warnings raised during the test.
    #[serde(default)]
    pub warnings: Vec<TestError>,
    /// Time statistics.
    #[serde(default)]
    pub time: Option<TimeReport>,
    /// Step/action/result counters.
    #[serde(default)]
    pub stats: Option<StatsReport>,
}

/// Time statistics as serialized in scenario reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeReport {
    /// Start time, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// End time, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Elapsed seconds. Informative only; recomputed from start/end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

/// Step/action/result counters as serialized in scenario reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsReport {
    /// Step statistics.
    #[serde(default)]
    pub steps: ExecTotalStats,
    /// Action statistics.
    #[serde(default)]
    pub actions: ExecTotalStats,
    /// Expected result statistics.
    #[serde(default)]
    pub results: ExecTotalStats,
}

impl ScenarioReport {
    /// Build the serializable report for a scenario execution.
    pub fn from_execution(execution: &ScenarioExecution) -> Self {
        Self {
            name: execution.name.clone(),
            status: execution.status,
            attributes: execution.attributes.clone(),
            errors: execution.errors.clone(),
            warnings: execution.warnings.clone(),
            time: Some(TimeReport {
                start: execution.time.start.map(|start| start.to_rfc3339()),
                end: execution.time.end.map(|end| end.to_rfc3339()),
                elapsed: execution.time.elapsed_secs(),
            }),
            stats: Some(StatsReport {
                steps: execution.steps,
                actions: execution.actions,
                results: execution.results,
            }),
        }
    }

    /// Turn the report back into an in-memory scenario execution.
    pub fn into_execution(self) -> ScenarioExecution {
        let mut time = TimeStats::default();
        if let Some(time_report) = &self.time {
            time.start = time_report.start.as_deref().and_then(parse_rfc3339);
            time.end = time_report.end.as_deref().and_then(parse_rfc3339);
        }
        let stats = self.stats.unwrap_or_default();
        ScenarioExecution {
            name: self.name,
            status: self.status,
            attributes: self.attributes,
            errors: self.errors,
            warnings: self.warnings,
            time,
            steps: stats.steps,
            actions: stats.actions,
            results: stats.results,
        }
    }
}

fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            tracing::debug!("Unreadable timestamp {:?}: {}", text, err);
            None
        }
    }
}

/// Read and parse a scenario report file.
pub fn read_scenario_report(path: &Path) -> Result<ScenarioExecution> {
    tracing::debug!("Reading scenario report from '{}'", path.display());
    let content = std::fs::read(path)?;
    let report: ScenarioReport = serde_json::from_slice(&content)?;
    Ok(report.into_execution())
}

/// Write a scenario report file.
pub fn write_scenario_report(path: &Path, execution: &ScenarioExecution) -> Result<()> {
    tracing::debug!("Writing scenario report to '{}'", path.display());
    let report = ScenarioReport::from_execution(execution);
    let content = serde_json::to_vec_pretty(&report)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Write the JUnit campaign report.
///
/// One `<testsuite>` per suite file, one `<testcase>` per scenario script.
/// Failed cases carry a `<failure>` with their error messages; cases
/// without any scenario view carry an `<error>`.
pub fn write_campaign_report(campaign: &CampaignExecution, path: &Path) -> Result<()> {
    let report_write = |reason: String| Error::ReportWrite {
        path: path.to_path_buf(),
        reason,
    };

    let mut report = Report::new("campaign");
    if let Some(start) = campaign.time.start {
        report.set_timestamp(start);
    }
    if let Some(elapsed) = campaign.time.elapsed() {
        report.set_time(elapsed);
    }

    for suite in &campaign.test_suite_executions {
        let mut junit_suite = TestSuite::new(suite.name.clone());
        if let Some(start) = suite.time.start {
            junit_suite.set_timestamp(start);
        }
        if let Some(elapsed) = suite.time.elapsed() {
            junit_suite.set_time(elapsed);
        }

        for case in &suite.test_case_executions {
            let status = match case.scenario_execution() {
                None => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Error);
                    status.set_message("no result data");
                    status
                }
                Some(scenario) if !scenario.errors.is_empty() => {
                    let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                    status.set_message(scenario.errors[0].message.clone());
                    status.set_description(
                        scenario
                            .errors
                            .iter()
                            .map(|error| error.message.as_str())
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                    status
                }
                Some(_) => TestCaseStatus::success(),
            };

            let mut junit_case = TestCase::new(case.name(), status);
            if let Some(elapsed) = case.time.elapsed() {
                junit_case.set_time(elapsed);
            }
            junit_suite.add_test_case(junit_case);
        }
        report.add_test_suite(junit_suite);
    }

    let serialized = report
        .to_string()
        .map_err(|err| report_write(err.to_string()))?;
    std::fs::write(path, serialized).map_err(|err| report_write(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{TestCaseExecution, TestSuiteExecution};

    #[test]
    fn scenario_report_round_trip() {
        let mut execution = ScenarioExecution::new("demo");
        execution.status = ExecutionStatus::Fail;
        execution.errors.push(TestError::new("assertion failed"));
        execution.steps = ExecTotalStats {
            executed: 1,
            total: 3,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        write_scenario_report(&path, &execution).unwrap();
        let read_back = read_scenario_report(&path).unwrap();

        assert_eq!(read_back.name, "demo");
        assert_eq!(read_back.status, ExecutionStatus::Fail);
        assert_eq!(read_back.errors, execution.errors);
        assert_eq!(read_back.steps, execution.steps);
    }

    #[test]
    fn minimal_report_parses_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.json");
        std::fs::write(&path, br#"{"name": "tiny", "status": "SUCCESS"}"#).unwrap();

        let execution = read_scenario_report(&path).unwrap();
        assert_eq!(execution.name, "tiny");
        assert_eq!(execution.status, ExecutionStatus::Success);
        assert!(execution.errors.is_empty());
        assert_eq!(execution.steps, ExecTotalStats::default());
    }

    #[test]
    fn unparsable_report_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(read_scenario_report(&path).is_err());
    }

    #[test]
    fn junit_report_reflects_case_outcomes() {
        let mut campaign = CampaignExecution::new("out");
        let mut suite = TestSuiteExecution::new("demo.lst");

        let mut passed = TestCaseExecution::new("pass.case");
        passed.report.content = Some(ScenarioExecution::new("pass"));

        let mut failed = TestCaseExecution::new("fail.case");
        let mut scenario = ScenarioExecution::new("fail");
        scenario.status = ExecutionStatus::Fail;
        scenario.errors.push(TestError::new("assertion failed"));
        failed.report.content = Some(scenario);

        let lost = TestCaseExecution::new("lost.case");

        suite.test_case_executions.push(passed);
        suite.test_case_executions.push(failed);
        suite.test_case_executions.push(lost);
        campaign.test_suite_executions.push(suite);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campaign.xml");
        write_campaign_report(&campaign, &path).unwrap();

        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("<testsuites"));
        assert!(xml.contains("tests=\"3\""));
        assert!(xml.contains("failures=\"1\""));
        assert!(xml.contains("errors=\"1\""));
        assert!(xml.contains("assertion failed"));
    }
}
