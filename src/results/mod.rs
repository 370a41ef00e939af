//! Campaign execution results
//!
//! The `CampaignExecution` tree stores what happened: it owns a list of
//! `TestSuiteExecution` instances, which own a list of `TestCaseExecution`
//! instances (one per scenario script). Aggregate statistics are recomputed
//! by tree walk on every access, never cached.

pub mod campaign;
pub mod scenario;
pub mod stats;

pub use campaign::{
    CampaignExecution, JsonReportReader, LogFileReader, TestCaseExecution, TestSuiteExecution,
};
pub use scenario::{ExecutionStatus, ScenarioExecution, TestError};
pub use stats::{CampaignStats, ExecTotalStats, TimeStats};
