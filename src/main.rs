//! convoy - test campaign runner
//!
//! Executes test scenarios declared in suite files, one child process per
//! scenario, and aggregates the outcomes into a campaign report.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use convoy::common::config::DEFAULT_CASE_TIMEOUT_SECS;
use convoy::{common, CampaignConfig, CampaignOrchestrator, Error, ExitCode};

#[derive(Parser)]
#[command(name = "convoy", about = "Test campaign runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Test suite files to execute, in order.
    #[arg(value_name = "TEST_SUITE_PATH", required = true)]
    test_suite_paths: Vec<PathBuf>,

    /// Output directory for test logs, reports and the campaign report.
    #[arg(long, default_value = "output")]
    outdir: PathBuf,

    /// Nest results under a '<outdir>/<date-time>/' subdirectory.
    #[arg(long)]
    dt_subdir: bool,

    /// Scenario runner executable launched once per test case.
    #[arg(long, value_name = "PATH")]
    runner: PathBuf,

    /// Configuration file forwarded to each scenario run.
    #[arg(long = "config-file", value_name = "PATH")]
    config_files: Vec<PathBuf>,

    /// Single configuration value forwarded to each scenario run.
    #[arg(
        long = "config-value",
        value_names = ["KEY", "VALUE"],
        num_args = 2,
        action = clap::ArgAction::Append
    )]
    config_values: Vec<String>,

    /// Generate documentation without executing the tests.
    #[arg(long)]
    doc_only: bool,

    /// Issue level from which known issues are considered as errors.
    #[arg(long, value_name = "LEVEL")]
    issue_level_error: Option<i64>,

    /// Issue level up to which known issues are ignored.
    #[arg(long, value_name = "LEVEL")]
    issue_level_ignored: Option<i64>,

    /// Per-case timeout in seconds. 0 waits indefinitely.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CASE_TIMEOUT_SECS as f64)]
    timeout: f64,

    /// Whether scenario logs carry date/time prefixes.
    #[arg(long, value_name = "BOOL")]
    log_datetime: Option<bool>,

    /// Scenario attribute displayed as extra info in the final summary.
    #[arg(long = "extra-info", value_name = "ATTRIBUTE")]
    extra_info: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<CampaignConfig, Error> {
        for path in &self.test_suite_paths {
            if !path.is_file() {
                return Err(Error::NoSuchFile(path.clone()));
            }
        }

        let mut config = CampaignConfig::new(self.test_suite_paths, self.runner, self.outdir);
        config.dt_subdir = self.dt_subdir;
        config.config_files = self.config_files;
        config.config_values = self
            .config_values
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect();
        config.doc_only = self.doc_only;
        config.issue_level_error = self.issue_level_error;
        config.issue_level_ignored = self.issue_level_ignored;
        config.log_datetime = self.log_datetime;
        config.case_timeout = if self.timeout > 0.0 {
            Some(Duration::from_secs_f64(self.timeout))
        } else {
            None
        };
        config.extra_info = self.extra_info;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    common::logging::init();

    let cli = Cli::parse();
    let exit_code = match cli.into_config() {
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code()
        }
        Ok(config) => {
            let mut orchestrator = CampaignOrchestrator::new(config);
            match orchestrator.run().await {
                Err(err) => {
                    eprintln!("Error: {err}");
                    err.exit_code()
                }
                Ok(campaign) => {
                    let counts = campaign.counts();
                    if counts.failures + counts.errors > 0 {
                        ExitCode::TestError
                    } else {
                        ExitCode::Success
                    }
                }
            }
        }
    };

    std::process::exit(exit_code as i32);
}
