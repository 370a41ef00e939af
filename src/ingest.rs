//! Fallback result reconstruction
//!
//! Given a finished process for one test case, produce a best-effort
//! scenario view. The structured JSON report is authoritative when it can
//! be read; otherwise a minimal scenario execution is synthesized from the
//! exit status, the log file and the captured stdout/stderr, so that every
//! scheduled case always exposes a result.
//!
//! This procedure never fails: read and parse problems are debug-logged
//! and degrade to the next tier.

use std::sync::OnceLock;

use regex::bytes::Regex;

use crate::common::ExitCode;
use crate::process::{ProcessHandle, ProcessStatus};
use crate::results::{ScenarioExecution, TestCaseExecution, TestError};

/// Log line pattern announcing an error: an optional ISO 8601 prefix, then
/// `ERROR` padded with 4 spaces (2 more for exception details).
const ERROR_LINE_PATTERN: &str = concat!(
    r"^([0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3,}[+-][0-9]{2}:[0-9]{2} - )?",
    r"ERROR {4}( {2})?(.*)$",
);

fn error_line_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(ERROR_LINE_PATTERN).expect("invalid error line pattern"))
}

/// Load or synthesize the scenario view for a finished test case.
///
/// The case's log and report paths must be set beforehand; its `report`
/// content is populated on return, either from the report file or from
/// fallback reconstruction.
pub fn ingest_case_result(case: &mut TestCaseExecution, process: &ProcessHandle) {
    // Read the log outfile.
    match case.log.path.as_deref() {
        Some(log_path) if log_path.is_file() => {
            tracing::debug!("Reading '{}'", log_path.display());
            if let Err(err) = case.log.read() {
                tracing::debug!("Error while reading {} log file: {}", case.name(), err);
            }
        }
        Some(log_path) => tracing::debug!("No such file '{}'", log_path.display()),
        None => {}
    }

    // Read the scenario report outfile.
    match case.report.path.as_deref() {
        Some(report_path) if report_path.is_file() => {
            tracing::debug!("Reading '{}'", report_path.display());
            if let Err(err) = case.report.read() {
                tracing::debug!("Error while reading {} scenario report: {}", case.name(), err);
            }
        }
        Some(report_path) => tracing::debug!("No such file '{}'", report_path.display()),
        None => {}
    }

    if case.scenario_execution().is_some() {
        return;
    }

    tracing::debug!("Using fallback scenario data for {}", case.name());
    case.report.content = Some(synthesize(case, process));
}

/// Build a minimal scenario execution from whatever the process left
/// behind.
fn synthesize(case: &TestCaseExecution, process: &ProcessHandle) -> ScenarioExecution {
    let script_path = case.script_path.display();
    let mut fallback = ScenarioExecution::new(case.name());
    // Bracket the synthesized scenario with the case's own timing.
    fallback.time.start = case.time.start;

    match process.status {
        ProcessStatus::NotStarted => {
            fallback
                .errors
                .push(TestError::new(format!("'{script_path}' could not be executed")));
        }
        ProcessStatus::TimedOut => {
            let elapsed = process.time.elapsed_secs().unwrap_or(0.0);
            fallback.errors.push(TestError::new(format!(
                "'{script_path}' did not return within {elapsed:.3} seconds"
            )));
        }
        ProcessStatus::Completed(0) => {}
        ProcessStatus::Completed(code) => {
            fallback.errors.push(TestError::new(format!(
                "'{script_path}' failed with error code {code} ({})",
                ExitCode::describe(code)
            )));
        }
    }

    // Scan the log output for error lines.
    if let Some(content) = case.log.content.as_deref() {
        tracing::debug!("Reading error lines from log output");
        scan_log_errors(content, &mut fallback.errors);
    }

    // Stdout should normally be empty (the child logs to its log file).
    // If any, save it as an error.
    if !process.stdout.is_empty() {
        fallback
            .errors
            .push(TestError::new(lossy_string(&process.stdout)));
    }

    // Save stderr as well.
    if !process.stderr.is_empty() {
        fallback
            .errors
            .push(TestError::new(lossy_string(&process.stderr)));
    }

    // A missing script file makes the child fail on its arguments before
    // its logging is up, so nothing above caught the real cause.
    if process.status == ProcessStatus::Completed(ExitCode::ArgumentsError as i32)
        && !case.script_path.is_file()
    {
        fallback
            .errors
            .push(TestError::new(format!("No such file '{script_path}'")));
    }

    fallback.status = fallback.derived_status();
    fallback.time.set_end_time();
    fallback
}

/// Collect ERROR lines from a log output.
///
/// Each matching line starts a new error. A non-matching line inside an
/// error block is a continuation regardless of content: it is appended to
/// the previous error's message with a newline separator, until the next
/// matching line starts a new error.
fn scan_log_errors(content: &[u8], errors: &mut Vec<TestError>) {
    let regex = error_line_regex();
    let mut in_error_block = false;

    let mut lines: Vec<&[u8]> = content.split(|byte| *byte == b'\n').collect();
    if matches!(lines.last(), Some(line) if line.is_empty()) {
        // A trailing newline is an end-of-line, not an empty last line.
        lines.pop();
    }

    for line in lines {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if let Some(captures) = regex.captures(line) {
            let message = captures
                .get(3)
                .map(|group| lossy_string(group.as_bytes()))
                .unwrap_or_default();
            errors.push(TestError::new(message));
            in_error_block = true;
        } else if in_error_block {
            if let Some(last) = errors.last_mut() {
                last.extend_message(&lossy_string(line));
            }
        }
    }
}

fn lossy_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ExecutionStatus;
    use std::time::Duration;

    fn finished_process(status: ProcessStatus) -> ProcessHandle {
        let mut process = ProcessHandle::new("scenario-runner");
        process.status = status;
        process.time.set_start_time();
        process.time.set_end_time();
        process
    }

    fn case_for(script: &str) -> TestCaseExecution {
        let mut case = TestCaseExecution::new(script);
        case.time.set_start_time();
        case
    }

    #[test]
    fn report_file_wins_over_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("demo.json");
        std::fs::write(&report_path, br#"{"name": "demo", "status": "SUCCESS"}"#).unwrap();

        let mut case = case_for("demo.case");
        case.report.path = Some(report_path);
        ingest_case_result(&mut case, &finished_process(ProcessStatus::Completed(0)));

        let scenario = case.scenario_execution().unwrap();
        assert_eq!(scenario.name, "demo");
        assert!(scenario.errors.is_empty());
    }

    #[test]
    fn unparsable_report_degrades_to_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("demo.json");
        std::fs::write(&report_path, b"{ not json").unwrap();

        let mut case = case_for("demo.case");
        case.report.path = Some(report_path);
        ingest_case_result(&mut case, &finished_process(ProcessStatus::Completed(0)));

        let scenario = case.scenario_execution().unwrap();
        assert_eq!(scenario.status, ExecutionStatus::Success);
        assert!(scenario.errors.is_empty());
    }

    #[test]
    fn timeout_produces_a_single_explanatory_error() {
        let mut process = finished_process(ProcessStatus::TimedOut);
        process.time.start = Some(chrono::Utc::now() - chrono::Duration::seconds(2));
        process.time.set_end_time();

        let mut case = case_for("hang.case");
        ingest_case_result(&mut case, &process);

        let scenario = case.scenario_execution().unwrap();
        assert_eq!(scenario.errors.len(), 1);
        assert!(scenario.errors[0].message.contains("did not return within"));
        assert_eq!(scenario.status, ExecutionStatus::Fail);
    }

    #[test]
    fn nonzero_exit_names_the_code() {
        let mut case = case_for("fail.case");
        ingest_case_result(&mut case, &finished_process(ProcessStatus::Completed(21)));

        let scenario = case.scenario_execution().unwrap();
        assert_eq!(scenario.errors.len(), 1);
        assert_eq!(
            scenario.errors[0].message,
            "'fail.case' failed with error code 21 (TEST_ERROR)"
        );
    }

    #[test]
    fn unknown_exit_code_still_reported() {
        let mut case = case_for("fail.case");
        ingest_case_result(&mut case, &finished_process(ProcessStatus::Completed(3)));

        let scenario = case.scenario_execution().unwrap();
        assert!(scenario.errors[0]
            .message
            .contains("error code 3 (unknown error code)"));
    }

    #[test]
    fn log_error_lines_with_continuations() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("fail.log");
        std::fs::write(
            &log_path,
            b"2024-01-01T00:00:00.000000+00:00 - ERROR    Boom\n  extra detail\n",
        )
        .unwrap();

        let mut case = case_for("fail.case");
        case.log.path = Some(log_path);
        ingest_case_result(&mut case, &finished_process(ProcessStatus::Completed(3)));

        let scenario = case.scenario_execution().unwrap();
        let matching: Vec<_> = scenario
            .errors
            .iter()
            .filter(|error| error.message == "Boom\n  extra detail")
            .collect();
        assert_eq!(matching.len(), 1);
    }

    #[test]
    fn two_continuation_lines_stay_in_one_error() {
        let mut errors = Vec::new();
        scan_log_errors(
            b"ERROR    Boom\n  first detail\n  second detail\n",
            &mut errors,
        );

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Boom\n  first detail\n  second detail");
    }

    #[test]
    fn each_error_line_starts_a_new_error() {
        let mut errors = Vec::new();
        scan_log_errors(b"ERROR    first\nERROR    second\n", &mut errors);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "first");
        assert_eq!(errors[1].message, "second");
    }

    #[test]
    fn plain_error_lines_without_timestamp_match() {
        let mut errors = Vec::new();
        scan_log_errors(b"ERROR      padded detail\n", &mut errors);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "padded detail");
    }

    #[test]
    fn stray_stdout_and_stderr_become_errors() {
        let mut process = finished_process(ProcessStatus::Completed(0));
        process.stdout = b"unexpected stdout\n".to_vec();
        process.stderr = b"unexpected stderr\n".to_vec();

        let mut case = case_for("chatty.case");
        ingest_case_result(&mut case, &process);

        let scenario = case.scenario_execution().unwrap();
        assert_eq!(scenario.errors.len(), 2);
        assert_eq!(scenario.errors[0].message, "unexpected stdout\n");
        assert_eq!(scenario.errors[1].message, "unexpected stderr\n");
    }

    #[test]
    fn missing_script_with_arguments_error_sentinel() {
        let mut case = case_for("no/such/script.case");
        ingest_case_result(
            &mut case,
            &finished_process(ProcessStatus::Completed(ExitCode::ArgumentsError as i32)),
        );

        let scenario = case.scenario_execution().unwrap();
        assert!(scenario
            .errors
            .iter()
            .any(|error| error.message == "No such file 'no/such/script.case'"));
    }

    #[test]
    fn clean_exit_without_report_synthesizes_success() {
        let mut case = case_for("quiet.case");
        ingest_case_result(&mut case, &finished_process(ProcessStatus::Completed(0)));

        let scenario = case.scenario_execution().unwrap();
        assert_eq!(scenario.status, ExecutionStatus::Success);
        assert!(scenario.errors.is_empty());
        assert!(scenario.time.elapsed().is_some());
    }

    #[test]
    fn fallback_elapsed_roughly_matches_timeout() {
        let mut process = finished_process(ProcessStatus::TimedOut);
        process.time.start = Some(chrono::Utc::now() - chrono::Duration::seconds(2));
        process.time.set_end_time();

        let elapsed = process.time.elapsed().unwrap();
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed <= Duration::from_secs(10));
    }
}
