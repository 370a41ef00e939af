//! Common utilities shared across the campaign runner

pub mod config;
pub mod error;
pub mod logging;

pub use config::CampaignConfig;
pub use error::{Error, ExitCode, Result};
