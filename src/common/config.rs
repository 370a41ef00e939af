//! Campaign configuration
//!
//! Assembled from the command line by the binary entry point, or
//! programmatically by library users. Configuration files and single
//! configuration values are not interpreted here: they are forwarded
//! verbatim to each child process.

use std::path::PathBuf;
use std::time::Duration;

/// Per-case timeout applied when none is configured, in seconds.
pub const DEFAULT_CASE_TIMEOUT_SECS: u64 = 600;

/// Campaign runner configuration
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Test suite files to execute, in order.
    pub test_suite_paths: Vec<PathBuf>,
    /// Output directory for logs, reports and the campaign report.
    pub outdir: PathBuf,
    /// Nest results under a `<outdir>/<date-time>/` subdirectory.
    pub dt_subdir: bool,
    /// Scenario runner executable launched once per test case.
    pub runner: PathBuf,
    /// Configuration files forwarded to each child (`--config-file`).
    pub config_files: Vec<PathBuf>,
    /// Configuration values forwarded to each child (`--config-value`).
    ///
    /// Ordered, so that child command lines are deterministic.
    pub config_values: Vec<(String, String)>,
    /// Documentation-only mode, forwarded to each child.
    pub doc_only: bool,
    /// Issue level from which known issues are considered errors.
    pub issue_level_error: Option<i64>,
    /// Issue level up to which known issues are ignored.
    pub issue_level_ignored: Option<i64>,
    /// Date/time logging flag, forwarded only when configured.
    pub log_datetime: Option<bool>,
    /// Campaign-wide per-case timeout. `None` waits indefinitely.
    pub case_timeout: Option<Duration>,
    /// Scenario attributes displayed as extra info in the final summary.
    pub extra_info: Vec<String>,
}

impl CampaignConfig {
    /// Minimal configuration for the given suite files, runner and outdir.
    pub fn new(
        test_suite_paths: Vec<PathBuf>,
        runner: impl Into<PathBuf>,
        outdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            test_suite_paths,
            outdir: outdir.into(),
            dt_subdir: false,
            runner: runner.into(),
            config_files: Vec::new(),
            config_values: Vec::new(),
            doc_only: false,
            issue_level_error: None,
            issue_level_ignored: None,
            log_datetime: None,
            case_timeout: Some(Duration::from_secs(DEFAULT_CASE_TIMEOUT_SECS)),
            extra_info: Vec::new(),
        }
    }
}
