//! Mock scenario runner binary for integration testing
//!
//! Stands in for a real scenario runner without requiring one: it parses
//! the command line the campaign builds for each test case, then follows
//! JSON directives read from the scenario script file itself (exit code,
//! log lines, report content, sleeps).

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use convoy::report;
use convoy::results::{ExecutionStatus, ScenarioExecution, TestError};

#[derive(Debug, Default)]
struct Args {
    config_values: BTreeMap<String, String>,
    report_path: Option<PathBuf>,
    script_path: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config-file" | "--issue-level-error" | "--issue-level-ignored" => {
                iter.next();
            }
            "--config-value" => {
                let key = iter.next().unwrap_or_default();
                let value = iter.next().unwrap_or_default();
                args.config_values.insert(key, value);
            }
            "--doc-only" => {}
            "--scenario-report" => {
                args.report_path = iter.next().map(PathBuf::from);
            }
            other => {
                args.script_path = Some(PathBuf::from(other));
            }
        }
    }
    args
}

/// Directives read from the scenario script file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Directives {
    /// Scenario name. Defaults to the script file stem.
    name: Option<String>,
    /// Forced status. Derived from errors/warnings when absent.
    status: Option<String>,
    /// Error messages for the report.
    errors: Vec<String>,
    /// Warning messages for the report.
    warnings: Vec<String>,
    /// Scenario attributes for the report.
    attributes: BTreeMap<String, String>,
    /// Lines written to the log file, newline terminated.
    log_lines: Vec<String>,
    /// Raw text written to standard output.
    stdout: Option<String>,
    /// Raw text written to standard error.
    stderr: Option<String>,
    /// Milliseconds to sleep before exiting.
    sleep_ms: Option<u64>,
    /// Leave no report file behind.
    skip_report: bool,
    /// Process exit code.
    exit_code: i32,
}

fn main() {
    let args = parse_args();

    let Some(script_path) = args.script_path else {
        eprintln!("missing scenario script argument");
        std::process::exit(41);
    };
    if !script_path.is_file() {
        eprintln!("no such file '{}'", script_path.display());
        std::process::exit(41);
    }

    let directives: Directives = std::fs::read_to_string(&script_path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default();

    if let Some(log_path) = args.config_values.get("LOG_FILE") {
        let mut content = String::new();
        for line in &directives.log_lines {
            content.push_str(line);
            content.push('\n');
        }
        std::fs::write(log_path, content).ok();
    }

    if let Some(text) = &directives.stdout {
        print!("{text}");
    }
    if let Some(text) = &directives.stderr {
        eprint!("{text}");
    }

    if let Some(sleep_ms) = directives.sleep_ms {
        std::thread::sleep(Duration::from_millis(sleep_ms));
    }

    if !directives.skip_report {
        if let Some(report_path) = &args.report_path {
            let execution = build_execution(&directives, &script_path);
            report::write_scenario_report(report_path, &execution).ok();
        }
    }

    std::process::exit(directives.exit_code);
}

fn build_execution(directives: &Directives, script_path: &std::path::Path) -> ScenarioExecution {
    let name = directives.name.clone().unwrap_or_else(|| {
        script_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scenario".to_string())
    });

    let mut execution = ScenarioExecution::new(name);
    execution.attributes = directives.attributes.clone();
    execution.errors = directives.errors.iter().map(TestError::new).collect();
    execution.warnings = directives.warnings.iter().map(TestError::new).collect();
    execution.time.set_start_time();
    execution.time.set_end_time();
    execution.status = match directives.status.as_deref() {
        Some(text) => parse_status(text),
        None => execution.derived_status(),
    };
    execution
}

fn parse_status(text: &str) -> ExecutionStatus {
    match text {
        "SUCCESS" => ExecutionStatus::Success,
        "WARNINGS" => ExecutionStatus::Warnings,
        "FAIL" => ExecutionStatus::Fail,
        "SKIPPED" => ExecutionStatus::Skipped,
        _ => ExecutionStatus::Unknown,
    }
}
