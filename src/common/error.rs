//! Error types for the campaign runner
//!
//! Two layers live here: the `Error` enum for everything that can abort a
//! campaign, and the `ExitCode` enumeration that the process terminates
//! with. Ordinary test failures are *data* in the result tree, never
//! `Error` values.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the campaign runner
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    #[error("No test suite files")]
    NoTestSuiteFiles,

    #[error("No such file '{}'", .0.display())]
    NoSuchFile(PathBuf),

    #[error("Failed to read test suite '{}': {reason}", path.display())]
    SuiteRead { path: PathBuf, reason: String },

    // === Environment Errors ===
    #[error("Failed to create output directory '{}': {source}", path.display())]
    OutdirCreation { path: PathBuf, source: io::Error },

    #[error("Failed to write campaign report '{}': {reason}", path.display())]
    ReportWrite { path: PathBuf, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a suite read error
    pub fn suite_read(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::SuiteRead {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Exit code the process should terminate with for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::NoTestSuiteFiles => ExitCode::InputMissingError,
            Error::NoSuchFile(_) => ExitCode::ArgumentsError,
            Error::SuiteRead { .. } => ExitCode::InputFormatError,
            Error::OutdirCreation { .. } | Error::ReportWrite { .. } | Error::Io(_) => {
                ExitCode::EnvironmentError
            }
            Error::Json(_) | Error::Internal(_) => ExitCode::InternalError,
        }
    }
}

/// Process exit codes.
///
/// Codes inspired from HTTP status codes, but kept below 256:
///
/// - 20-29: normal errors,
/// - 40-49: input related errors,
/// - 50-59: processing and output related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// At least one test failed.
    TestError = 21,
    /// Error due to the environment.
    EnvironmentError = 40,
    /// Error due to invalid arguments.
    ArgumentsError = 41,
    /// Error due to missing inputs.
    InputMissingError = 42,
    /// Error due to invalid input format.
    InputFormatError = 43,
    /// Internal error.
    InternalError = 50,
}

impl ExitCode {
    /// Look up the enumeration member for a raw process exit code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            21 => Some(ExitCode::TestError),
            40 => Some(ExitCode::EnvironmentError),
            41 => Some(ExitCode::ArgumentsError),
            42 => Some(ExitCode::InputMissingError),
            43 => Some(ExitCode::InputFormatError),
            50 => Some(ExitCode::InternalError),
            _ => None,
        }
    }

    /// Symbolic name, as displayed in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::TestError => "TEST_ERROR",
            ExitCode::EnvironmentError => "ENVIRONMENT_ERROR",
            ExitCode::ArgumentsError => "ARGUMENTS_ERROR",
            ExitCode::InputMissingError => "INPUT_MISSING_ERROR",
            ExitCode::InputFormatError => "INPUT_FORMAT_ERROR",
            ExitCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Describe a raw exit code, for fallback error messages.
    ///
    /// Unknown codes yield a fixed "unknown error code" text rather than
    /// failing.
    pub fn describe(code: i32) -> &'static str {
        match Self::from_code(code) {
            Some(known) => known.name(),
            None => "unknown error code",
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_round_trip() {
        for code in [0, 21, 40, 41, 42, 43, 50] {
            let known = ExitCode::from_code(code).unwrap();
            assert_eq!(known as i32, code);
        }
        assert_eq!(ExitCode::from_code(3), None);
    }

    #[test]
    fn describe_known_and_unknown() {
        assert_eq!(ExitCode::describe(21), "TEST_ERROR");
        assert_eq!(ExitCode::describe(3), "unknown error code");
    }

    #[test]
    fn error_exit_codes() {
        assert_eq!(
            Error::NoTestSuiteFiles.exit_code(),
            ExitCode::InputMissingError
        );
        assert_eq!(
            Error::NoSuchFile(PathBuf::from("missing.lst")).exit_code(),
            ExitCode::ArgumentsError
        );
        assert_eq!(
            Error::Internal("boom".into()).exit_code(),
            ExitCode::InternalError
        );
    }
}
