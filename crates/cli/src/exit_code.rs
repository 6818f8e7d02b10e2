//! Process exit codes
//!
//! Scripts wrapping `cfv` can tell a bad credentials file from an
//! unreachable service by the exit status alone.

/// Exit status of a `cfv` run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Browsing ended normally
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// Unreadable credentials or settings file
    UsageError = 2,
    /// The HTTP client could not be built
    NetworkError = 3,
    /// Credentials rejected or no token could be obtained
    AuthError = 4,
}

impl ExitCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_u8())
    }
}
