//! Exit codes for the nt-core CLI.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (parse outcome from code, not output)
//! - 2: Invalid arguments (reported by clap)
//! - 10-19: User/input errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use crate::error::NoticeError;

/// Exit codes for nt-core operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: payload rendered / settings valid
    Clean = 0,

    /// The notice matched an ignore rule; nothing was rendered
    Ignored = 1,

    /// Settings could not be loaded or failed validation
    ConfigError = 11,

    /// Input document could not be read or parsed
    InputError = 12,

    /// A filter predicate failed during cleaning
    CleaningError = 13,

    /// An ignore predicate failed
    SuppressionError = 14,

    /// The notice could not be rendered
    SerializationError = 15,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error writing output
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an operational outcome.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Ignored => "OK_IGNORED",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::CleaningError => "ERR_CLEANING",
            ExitCode::SuppressionError => "ERR_SUPPRESSION",
            ExitCode::SerializationError => "ERR_SERIALIZATION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&NoticeError> for ExitCode {
    fn from(err: &NoticeError) -> Self {
        match err {
            NoticeError::Cleaning(_) => ExitCode::CleaningError,
            NoticeError::Suppression { .. } => ExitCode::SuppressionError,
            NoticeError::Serialization(_) => ExitCode::SerializationError,
            NoticeError::Config(_) => ExitCode::ConfigError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
