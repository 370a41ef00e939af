//! Campaign / test suite / test case execution records
//!
//! Pure data plus derived accessors. Every aggregate performs a fresh tree
//! walk; a test case lacking a scenario view contributes a conservative
//! FAIL with zero counters rather than being skipped, so campaign counts
//! never under-report scheduled cases.

use std::path::{Path, PathBuf};

use crate::common::Result;
use crate::report;

use super::scenario::{ExecutionStatus, ScenarioExecution, TestError};
use super::stats::{CampaignStats, ExecTotalStats, TimeStats};

/// Default campaign report file name under the output directory.
pub const CAMPAIGN_REPORT_FILENAME: &str = "campaign.xml";

/// Main campaign result object.
#[derive(Debug, Default)]
pub struct CampaignExecution {
    /// Output directory path.
    pub outdir: PathBuf,
    /// Test suite results, in declared order.
    pub test_suite_executions: Vec<TestSuiteExecution>,
    /// Time statistics.
    pub time: TimeStats,
}

impl CampaignExecution {
    /// New campaign execution writing under the given output directory.
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            test_suite_executions: Vec::new(),
            time: TimeStats::default(),
        }
    }

    /// Campaign report path under the output directory.
    pub fn campaign_report_path(&self) -> PathBuf {
        self.outdir.join(CAMPAIGN_REPORT_FILENAME)
    }

    /// Step statistics, recomputed over every suite.
    pub fn steps(&self) -> ExecTotalStats {
        let mut stats = ExecTotalStats::default();
        for suite in &self.test_suite_executions {
            stats.add(&suite.steps());
        }
        stats
    }

    /// Action statistics, recomputed over every suite.
    pub fn actions(&self) -> ExecTotalStats {
        let mut stats = ExecTotalStats::default();
        for suite in &self.test_suite_executions {
            stats.add(&suite.actions());
        }
        stats
    }

    /// Expected result statistics, recomputed over every suite.
    pub fn results(&self) -> ExecTotalStats {
        let mut stats = ExecTotalStats::default();
        for suite in &self.test_suite_executions {
            stats.add(&suite.results());
        }
        stats
    }

    /// Campaign counters, recomputed over every suite.
    pub fn counts(&self) -> CampaignStats {
        let mut stats = CampaignStats::default();
        for suite in &self.test_suite_executions {
            stats.add(&suite.counts());
        }
        stats
    }
}

/// Test suite execution record.
#[derive(Debug)]
pub struct TestSuiteExecution {
    /// Test suite file path.
    pub suite_path: PathBuf,
    /// Test suite name.
    pub name: String,
    /// Test case results, in declared order.
    pub test_case_executions: Vec<TestCaseExecution>,
    /// Time statistics.
    pub time: TimeStats,
}

impl TestSuiteExecution {
    /// New suite execution for the given suite file.
    pub fn new(suite_path: impl Into<PathBuf>) -> Self {
        let suite_path = suite_path.into();
        let name = suite_path.display().to_string();
        Self {
            suite_path,
            name,
            test_case_executions: Vec::new(),
            time: TimeStats::default(),
        }
    }

    /// Step statistics over the suite's cases.
    pub fn steps(&self) -> ExecTotalStats {
        let mut stats = ExecTotalStats::default();
        for case in &self.test_case_executions {
            stats.add(&case.steps());
        }
        stats
    }

    /// Action statistics over the suite's cases.
    pub fn actions(&self) -> ExecTotalStats {
        let mut stats = ExecTotalStats::default();
        for case in &self.test_case_executions {
            stats.add(&case.actions());
        }
        stats
    }

    /// Expected result statistics over the suite's cases.
    pub fn results(&self) -> ExecTotalStats {
        let mut stats = ExecTotalStats::default();
        for case in &self.test_case_executions {
            stats.add(&case.results());
        }
        stats
    }

    /// Suite counters.
    ///
    /// A case without a scenario view counts as one error; a case whose
    /// scenario carries errors counts as a failure; warnings otherwise.
    pub fn counts(&self) -> CampaignStats {
        let mut stats = CampaignStats {
            total: self.test_case_executions.len(),
            ..Default::default()
        };
        for case in &self.test_case_executions {
            match case.scenario_execution() {
                None => stats.errors += 1,
                Some(scenario) if !scenario.errors.is_empty() => stats.failures += 1,
                Some(scenario) if !scenario.warnings.is_empty() => stats.warnings += 1,
                Some(_) => {}
            }
        }
        stats
    }
}

/// Test case (i.e. test scenario) execution record.
#[derive(Debug)]
pub struct TestCaseExecution {
    /// Scenario script path.
    pub script_path: PathBuf,
    /// Time statistics.
    pub time: TimeStats,
    /// Test case log output.
    pub log: LogFileReader,
    /// Test case report output.
    pub report: JsonReportReader,
}

impl TestCaseExecution {
    /// New case execution for the given scenario script.
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            time: TimeStats::default(),
            log: LogFileReader::default(),
            report: JsonReportReader::default(),
        }
    }

    /// Scenario execution data, when available.
    pub fn scenario_execution(&self) -> Option<&ScenarioExecution> {
        self.report.content.as_ref()
    }

    /// Test case name: the scenario name when known, the script path
    /// otherwise.
    pub fn name(&self) -> String {
        match self.scenario_execution() {
            Some(scenario) => scenario.name.clone(),
            None => self.script_path.display().to_string(),
        }
    }

    /// Scenario execution status. FAIL when no scenario view is available.
    pub fn status(&self) -> ExecutionStatus {
        match self.scenario_execution() {
            Some(scenario) => scenario.status,
            None => ExecutionStatus::Fail,
        }
    }

    /// Test errors.
    pub fn errors(&self) -> &[TestError] {
        self.scenario_execution()
            .map(|scenario| scenario.errors.as_slice())
            .unwrap_or(&[])
    }

    /// Warnings.
    pub fn warnings(&self) -> &[TestError] {
        self.scenario_execution()
            .map(|scenario| scenario.warnings.as_slice())
            .unwrap_or(&[])
    }

    /// Step statistics. Zero when no scenario view is available.
    pub fn steps(&self) -> ExecTotalStats {
        self.scenario_execution()
            .map(|scenario| scenario.steps)
            .unwrap_or_default()
    }

    /// Action statistics. Zero when no scenario view is available.
    pub fn actions(&self) -> ExecTotalStats {
        self.scenario_execution()
            .map(|scenario| scenario.actions)
            .unwrap_or_default()
    }

    /// Expected result statistics. Zero when no scenario view is available.
    pub fn results(&self) -> ExecTotalStats {
        self.scenario_execution()
            .map(|scenario| scenario.results)
            .unwrap_or_default()
    }
}

/// Log file path and content.
#[derive(Debug, Default)]
pub struct LogFileReader {
    /// Test case log file path.
    pub path: Option<PathBuf>,
    /// Test case log file content, populated by `read()`.
    pub content: Option<Vec<u8>>,
}

impl LogFileReader {
    /// Read the log file into `content`.
    pub fn read(&mut self) -> Result<()> {
        let path = self.path.as_deref().ok_or_else(no_path)?;
        self.content = Some(std::fs::read(path)?);
        Ok(())
    }
}

/// Scenario report file path and content.
#[derive(Debug, Default)]
pub struct JsonReportReader {
    /// Test case JSON report file path.
    pub path: Option<PathBuf>,
    /// Scenario execution data read from the report, or synthesized.
    pub content: Option<ScenarioExecution>,
}

impl JsonReportReader {
    /// Read and parse the scenario report into `content`.
    pub fn read(&mut self) -> Result<()> {
        let path = self.path.as_deref().ok_or_else(no_path)?;
        self.content = Some(report::read_scenario_report(path)?);
        Ok(())
    }
}

fn no_path() -> crate::common::Error {
    crate::common::Error::Internal("no file path to read".into())
}

/// Output file path for a test case under the campaign output directory.
pub fn case_output_path(outdir: &Path, script_path: &Path, extension: &str) -> PathBuf {
    let stem = script_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "case".to_string());
    outdir.join(format!("{stem}{extension}"))
}
