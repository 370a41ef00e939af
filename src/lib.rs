//! Convoy - sequential test-campaign runner
//!
//! This library drives many independent test-case processes end to end,
//! collects their outcomes even when those outcomes are incompletely
//! reported, and rolls results up into an execution tree with aggregate
//! statistics.

pub mod common;
pub mod events;
pub mod ingest;
pub mod orchestrator;
pub mod process;
pub mod report;
pub mod results;
pub mod suite;
pub mod summary;

// Re-export commonly used types for tests
pub use common::{CampaignConfig, Error, ExitCode, Result};
pub use orchestrator::CampaignOrchestrator;
pub use process::{ProcessHandle, ProcessStatus};
