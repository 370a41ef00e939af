//! Final campaign summary printed on the console
//!
//! One line per test case plus a campaign total line. Error and warning
//! messages are repeated below their case so that the terminal alone is
//! enough to triage a red campaign.

use colored::{ColoredString, Colorize};

use crate::results::{CampaignExecution, ExecutionStatus, TestCaseExecution};

/// Print the campaign summary.
///
/// `extra_info` names scenario attributes appended to each case line.
pub fn display_results(campaign: &CampaignExecution, extra_info: &[String]) {
    println!("\n{}", "Campaign results:".bold());

    for suite in &campaign.test_suite_executions {
        println!("\n{}", suite.name.as_str().cyan());
        for case in &suite.test_case_executions {
            display_case(case, extra_info);
        }
    }

    let counts = campaign.counts();
    let numbers = format!(
        "{} tests, {} failures, {} errors, {} warnings",
        counts.total, counts.failures, counts.errors, counts.warnings
    );
    let numbers = if counts.failures + counts.errors > 0 {
        numbers.as_str().red().bold()
    } else if counts.warnings > 0 {
        numbers.as_str().yellow().bold()
    } else {
        numbers.as_str().green().bold()
    };
    println!(
        "\n{} (steps {}, actions {}, results {}){}",
        numbers,
        campaign.steps(),
        campaign.actions(),
        campaign.results(),
        elapsed_suffix(campaign.time.elapsed_secs()),
    );
}

fn display_case(case: &TestCaseExecution, extra_info: &[String]) {
    println!(
        "  {} {}{}{}",
        status_tag(case.status()),
        case.name(),
        elapsed_suffix(case.time.elapsed_secs()),
        extra_info_suffix(case, extra_info),
    );

    for error in case.errors() {
        for line in error.message.lines() {
            println!("      {} {}", "✗".red(), line);
        }
    }
    for warning in case.warnings() {
        for line in warning.message.lines() {
            println!("      {} {}", "!".yellow(), line);
        }
    }
}

fn status_tag(status: ExecutionStatus) -> ColoredString {
    match status {
        ExecutionStatus::Success => "SUCCESS ".green(),
        ExecutionStatus::Warnings => "WARNINGS".yellow(),
        ExecutionStatus::Skipped => "SKIPPED ".dimmed(),
        ExecutionStatus::Fail | ExecutionStatus::Unknown => "FAIL    ".red(),
    }
}

fn elapsed_suffix(elapsed: Option<f64>) -> String {
    match elapsed {
        Some(seconds) => format!(" ({seconds:.3} s)"),
        None => String::new(),
    }
}

/// Requested scenario attributes, missing ones rendered empty.
fn extra_info_suffix(case: &TestCaseExecution, extra_info: &[String]) -> String {
    if extra_info.is_empty() {
        return String::new();
    }
    let values: Vec<&str> = extra_info
        .iter()
        .map(|attribute| {
            case.scenario_execution()
                .and_then(|scenario| scenario.attributes.get(attribute))
                .map(String::as_str)
                .unwrap_or("")
        })
        .collect();
    format!(" [{}]", values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ScenarioExecution;

    fn case_with_attribute(name: &str, key: &str, value: &str) -> TestCaseExecution {
        let mut case = TestCaseExecution::new(format!("{name}.case"));
        let mut scenario = ScenarioExecution::new(name);
        scenario
            .attributes
            .insert(key.to_string(), value.to_string());
        case.report.content = Some(scenario);
        case
    }

    #[test]
    fn extra_info_renders_requested_attributes_in_order() {
        let case = case_with_attribute("demo", "AUTHOR", "qa-team");
        let suffix = extra_info_suffix(
            &case,
            &["AUTHOR".to_string(), "TITLE".to_string()],
        );
        assert_eq!(suffix, " [qa-team, ]");
    }

    #[test]
    fn extra_info_is_empty_without_request() {
        let case = case_with_attribute("demo", "AUTHOR", "qa-team");
        assert_eq!(extra_info_suffix(&case, &[]), "");
    }

    #[test]
    fn elapsed_suffix_formats_seconds() {
        assert_eq!(elapsed_suffix(Some(1.5)), " (1.500 s)");
        assert_eq!(elapsed_suffix(None), "");
    }
}
