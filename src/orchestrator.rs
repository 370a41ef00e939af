//! Campaign orchestration
//!
//! The orchestrator iterates suites, iterates cases per suite, and drives
//! one child process per case, strictly sequentially. It fails fatally only
//! on environment problems (output directory creation, final report
//! write); any number of per-case failures leaves it running to
//! completion, reflected purely in the result tree.

use std::path::{Path, PathBuf};

use crate::common::{CampaignConfig, Error, Result};
use crate::events::{CampaignEvent, CampaignHooks};
use crate::ingest;
use crate::process::ProcessHandle;
use crate::report;
use crate::results::{
    campaign::case_output_path, CampaignExecution, TestCaseExecution, TestSuiteExecution,
};
use crate::suite::TestSuiteFile;
use crate::summary;

/// Configuration key forcing the child's log file destination.
pub const LOG_FILE_KEY: &str = "LOG_FILE";
/// Configuration key forcing the child's console echo off.
pub const LOG_CONSOLE_KEY: &str = "LOG_CONSOLE";
/// Configuration key propagating the date/time-logging flag.
pub const LOG_DATETIME_KEY: &str = "LOG_DATETIME";

/// Suffix of per-case scenario report files.
pub const REPORT_SUFFIX: &str = ".json";
/// Suffix of per-case log files.
pub const LOG_SUFFIX: &str = ".log";

/// Campaign execution engine: runs test scenarios from suite files.
pub struct CampaignOrchestrator {
    config: CampaignConfig,
    hooks: CampaignHooks,
}

impl CampaignOrchestrator {
    /// New orchestrator for the given configuration.
    pub fn new(config: CampaignConfig) -> Self {
        Self {
            config,
            hooks: CampaignHooks::default(),
        }
    }

    /// Lifecycle hook registry.
    pub fn hooks_mut(&mut self) -> &mut CampaignHooks {
        &mut self.hooks
    }

    /// Execute the whole campaign.
    ///
    /// Returns the result tree on completion. The error path is reserved
    /// for environment defects and unusable inputs; test failures are data
    /// inside the returned tree.
    pub async fn run(&mut self) -> Result<CampaignExecution> {
        if self.config.test_suite_paths.is_empty() {
            tracing::error!("No test suite files");
            return Err(Error::NoTestSuiteFiles);
        }

        let outdir = self.resolve_outdir();
        std::fs::create_dir_all(&outdir).map_err(|source| Error::OutdirCreation {
            path: outdir.clone(),
            source,
        })?;
        tracing::info!("Campaign output directory: '{}'", outdir.display());

        let mut campaign = CampaignExecution::new(outdir);
        self.hooks
            .emit_campaign(CampaignEvent::BeforeCampaign, &campaign);

        campaign.time.set_start_time();
        let suite_paths = self.config.test_suite_paths.clone();
        for suite_path in suite_paths {
            self.exec_test_suite_file(&mut campaign, &suite_path).await?;
        }
        campaign.time.set_end_time();

        let report_path = campaign.campaign_report_path();
        report::write_campaign_report(&campaign, &report_path)?;
        tracing::info!("Campaign report: '{}'", report_path.display());

        summary::display_results(&campaign, &self.config.extra_info);
        self.hooks
            .emit_campaign(CampaignEvent::AfterCampaign, &campaign);

        Ok(campaign)
    }

    /// Output directory, nested under a date/time subdirectory on demand.
    fn resolve_outdir(&self) -> PathBuf {
        if self.config.dt_subdir {
            let subdir = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
            self.config.outdir.join(subdir)
        } else {
            self.config.outdir.clone()
        }
    }

    /// Execute one test suite file.
    async fn exec_test_suite_file(
        &mut self,
        campaign: &mut CampaignExecution,
        suite_path: &Path,
    ) -> Result<()> {
        let outdir = campaign.outdir.clone();
        let mut suite = TestSuiteExecution::new(suite_path);
        self.hooks
            .emit_test_suite(CampaignEvent::BeforeTestSuite, &suite);
        tracing::info!("Test suite '{}'", suite.name);

        suite.time.set_start_time();
        let result = self.exec_test_suite(&mut suite, &outdir).await;
        suite.time.set_end_time();

        self.hooks
            .emit_test_suite(CampaignEvent::AfterTestSuite, &suite);
        // The suite record is kept even when its file could not be parsed,
        // so the campaign tree accounts for everything it scheduled.
        campaign.test_suite_executions.push(suite);
        result
    }

    /// Execute the cases of one suite, every declared script
    /// unconditionally becoming exactly one case record.
    async fn exec_test_suite(
        &mut self,
        suite: &mut TestSuiteExecution,
        outdir: &Path,
    ) -> Result<()> {
        let mut suite_file = TestSuiteFile::new(&suite.suite_path);
        suite_file.read()?;

        for script_path in suite_file.script_paths {
            let mut case = TestCaseExecution::new(script_path);
            self.exec_test_case(outdir, &mut case).await;
            suite.test_case_executions.push(case);
        }
        Ok(())
    }

    /// Execute one test case. Never fails: whatever happens to the child
    /// process lands in the case record.
    async fn exec_test_case(&mut self, outdir: &Path, case: &mut TestCaseExecution) {
        self.hooks
            .emit_test_case(CampaignEvent::BeforeTestCase, case);
        tracing::info!("  Test case '{}'", case.script_path.display());
        case.time.set_start_time();

        case.report.path = Some(case_output_path(outdir, &case.script_path, REPORT_SUFFIX));
        case.log.path = Some(case_output_path(outdir, &case.script_path, LOG_SUFFIX));

        let mut process = self.build_case_process(case);
        let status = process.run(self.config.case_timeout).await;
        tracing::debug!("{} returned {:?}", process, status);

        ingest::ingest_case_result(case, &process);
        case.time.set_end_time();
        tracing::info!("    -> {}", case.status());

        for error in case.errors() {
            self.hooks.emit_error(error);
        }
        self.hooks
            .emit_test_case(CampaignEvent::AfterTestCase, case);
    }

    /// Build the child command line for one case, deterministically.
    fn build_case_process(&self, case: &TestCaseExecution) -> ProcessHandle {
        let mut process = ProcessHandle::new(&self.config.runner);

        // Forward configuration files and single configuration values from
        // campaign to scenario execution.
        for config_file in &self.config.config_files {
            process = process.arg("--config-file").arg(config_file);
        }
        for (name, value) in &self.config.config_values {
            process = process.arg("--config-value").arg(name).arg(value);
        }

        // Forward shared execution options.
        if self.config.doc_only {
            process = process.arg("--doc-only");
        }
        if let Some(level) = self.config.issue_level_error {
            process = process.arg("--issue-level-error").arg(level.to_string());
        }
        if let Some(level) = self.config.issue_level_ignored {
            process = process.arg("--issue-level-ignored").arg(level.to_string());
        }

        // Per-case outputs under the campaign output directory.
        if let Some(report_path) = &case.report.path {
            process = process.arg("--scenario-report").arg(report_path);
        }
        if let Some(log_path) = &case.log.path {
            process = process
                .arg("--config-value")
                .arg(LOG_FILE_KEY)
                .arg(log_path);
        }
        process = process.arg("--config-value").arg(LOG_CONSOLE_KEY).arg("0");
        if let Some(log_datetime) = self.config.log_datetime {
            process = process
                .arg("--config-value")
                .arg(LOG_DATETIME_KEY)
                .arg(if log_datetime { "1" } else { "0" });
        }

        // Script path last.
        process.arg(&case.script_path)
    }
}
