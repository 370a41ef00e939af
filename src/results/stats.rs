//! Common statistics: time brackets and executed/total counters

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Start/end time bracket around an execution.
#[derive(Debug, Clone, Default)]
pub struct TimeStats {
    /// Start time.
    pub start: Option<DateTime<Utc>>,
    /// End time.
    pub end: Option<DateTime<Utc>>,
}

impl TimeStats {
    /// Open the bracket. Clears any previous end time.
    pub fn set_start_time(&mut self) {
        self.start = Some(Utc::now());
        self.end = None;
    }

    /// Close the bracket.
    pub fn set_end_time(&mut self) {
        self.end = Some(Utc::now());
    }

    /// Elapsed time, available once both ends of the bracket are set.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (end - start).to_std().ok(),
            _ => None,
        }
    }

    /// Elapsed time in seconds, for messages and reports.
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.elapsed().map(|elapsed| elapsed.as_secs_f64())
    }
}

/// Executable item statistics: number of executed items over a total count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTotalStats {
    /// Count of items executed.
    pub executed: usize,
    /// Total count of executable items.
    pub total: usize,
}

impl ExecTotalStats {
    /// Integrate another counter into this one.
    pub fn add(&mut self, other: &ExecTotalStats) {
        self.executed += other.executed;
        self.total += other.total;
    }
}

impl std::fmt::Display for ExecTotalStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.executed, self.total)
    }
}

/// JUnit compatible campaign counters.
///
/// Tests are considered to have "failed" because of an assertion, and to be
/// in "error" because of an unexpected problem (crash, timeout, missing
/// report).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CampaignStats {
    /// Total number of test cases.
    pub total: usize,
    /// Number of test cases disabled.
    pub disabled: usize,
    /// Number of skipped test cases.
    pub skipped: usize,
    /// Number of tests that terminated with warnings.
    pub warnings: usize,
    /// Number of test cases that failed due to assertions.
    pub failures: usize,
    /// Number of test cases that failed unexpectedly.
    pub errors: usize,
}

impl CampaignStats {
    /// Integrate another set of counters into this one.
    pub fn add(&mut self, other: &CampaignStats) {
        self.total += other.total;
        self.disabled += other.disabled;
        self.skipped += other.skipped;
        self.warnings += other.warnings;
        self.failures += other.failures;
        self.errors += other.errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_stats_bracket() {
        let mut time = TimeStats::default();
        assert!(time.elapsed().is_none());
        time.set_start_time();
        assert!(time.elapsed().is_none());
        time.set_end_time();
        assert!(time.elapsed().is_some());
    }

    #[test]
    fn restarting_clears_end_time() {
        let mut time = TimeStats::default();
        time.set_start_time();
        time.set_end_time();
        time.set_start_time();
        assert!(time.end.is_none());
        assert!(time.elapsed().is_none());
    }

    #[test]
    fn exec_total_add() {
        let mut stats = ExecTotalStats::default();
        stats.add(&ExecTotalStats {
            executed: 2,
            total: 3,
        });
        stats.add(&ExecTotalStats {
            executed: 1,
            total: 1,
        });
        assert_eq!(stats.executed, 3);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.to_string(), "3/4");
    }

    #[test]
    fn campaign_stats_add() {
        let mut stats = CampaignStats::default();
        stats.add(&CampaignStats {
            total: 2,
            failures: 1,
            ..Default::default()
        });
        stats.add(&CampaignStats {
            total: 1,
            errors: 1,
            ..Default::default()
        });
        assert_eq!(stats.total, 3);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.errors, 1);
    }
}
