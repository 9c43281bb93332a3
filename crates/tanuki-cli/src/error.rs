//! CLI error handling with semantic exit codes.
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | Command completed successfully |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments, options or configuration |
//! | 3 | `NotFound` | Group or project not found |
//! | 4 | `Auth` | Token rejected or missing permissions |
//! | 5 | `Network` | Transport failure or server unavailable |
//! | 6 | `Protocol` | Unexpected response from the server |
//! | 130 | `Interrupted` | Stopped by Ctrl-C before the search finished |
//!
//! ```bash
//! tanuki search -g backend hello_there
//! case $? in
//!     0) echo "done" ;;
//!     4) echo "check your token" ;;
//!     *) echo "other error" ;;
//! esac
//! ```

use std::fmt;
use std::process::ExitCode;

use tanuki_core::Error;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    Usage = 2,

    /// Requested group or project not found (exit code 3).
    NotFound = 3,

    /// Authentication or authorization failure (exit code 4).
    Auth = 4,

    /// Network or server failure (exit code 5).
    ///
    /// Covers transport errors as well as rate limiting and 5xx responses
    /// that outlived their retries.
    Network = 5,

    /// Response the client could not interpret (exit code 6).
    Protocol = 6,

    /// Stopped by Ctrl-C (exit code 130, the shell convention for SIGINT).
    Interrupted = 130,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::NotFound => "not found",
            Self::Auth => "authentication error",
            Self::Network => "network error",
            Self::Protocol => "protocol error",
            Self::Interrupted => "interrupted",
        }
    }

    /// Category of a core error.
    #[must_use]
    pub const fn of_core(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidOptions(_) | Error::InvalidUrl(_) => Self::Usage,
            Error::NotFound(_) => Self::NotFound,
            Error::Authentication(_) => Self::Auth,
            Error::Transient(_) | Error::Network(_) => Self::Network,
            Error::MalformedResponse(_) => Self::Protocol,
            Error::Io(_) | Error::Serialization(_) | Error::Worker(_) => Self::Internal,
        }
    }

    /// Category of any error reaching `main`.
    ///
    /// Walks the chain looking for [`Interrupted`] or a
    /// [`tanuki_core::Error`]; anything else is internal.
    #[must_use]
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if err.chain().any(|cause| cause.is::<Interrupted>()) {
            return Self::Interrupted;
        }
        err.chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .map_or(Self::Internal, Self::of_core)
    }
}

/// The user stopped the search before it completed.
///
/// Matches printed before the interrupt stay on stdout; this only changes
/// the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("search stopped before completion, results may be partial")
    }
}

impl std::error::Error for Interrupted {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorCategory::Internal.exit_code(), 1);
        assert_eq!(ErrorCategory::Usage.exit_code(), 2);
        assert_eq!(ErrorCategory::NotFound.exit_code(), 3);
        assert_eq!(ErrorCategory::Auth.exit_code(), 4);
        assert_eq!(ErrorCategory::Network.exit_code(), 5);
        assert_eq!(ErrorCategory::Protocol.exit_code(), 6);
        assert_eq!(ErrorCategory::Interrupted.exit_code(), 130);
    }

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (Error::Config("x".into()), ErrorCategory::Usage),
            (Error::InvalidOptions("x".into()), ErrorCategory::Usage),
            (Error::InvalidUrl("x".into()), ErrorCategory::Usage),
            (Error::NotFound("x".into()), ErrorCategory::NotFound),
            (Error::Authentication("x".into()), ErrorCategory::Auth),
            (Error::Transient("x".into()), ErrorCategory::Network),
            (Error::MalformedResponse("x".into()), ErrorCategory::Protocol),
            (Error::Worker("x".into()), ErrorCategory::Internal),
        ];
        for (err, expected) in cases {
            assert_eq!(ErrorCategory::of_core(&err), expected, "{err}");
        }
    }

    #[test]
    fn test_from_anyhow_finds_core_error_through_context() {
        let err = Err::<(), _>(Error::Authentication("401".into()))
            .context("searching group 'backend'")
            .unwrap_err();
        assert_eq!(ErrorCategory::from_anyhow(&err), ErrorCategory::Auth);
    }

    #[test]
    fn test_from_anyhow_detects_interrupt() {
        let err = anyhow::Error::new(Interrupted).context("search for 'needle' failed");
        assert_eq!(ErrorCategory::from_anyhow(&err), ErrorCategory::Interrupted);
        assert!(format!("{err:#}").contains("results may be partial"));
    }

    #[test]
    fn test_from_anyhow_defaults_to_internal() {
        let err = anyhow!("something odd");
        assert_eq!(ErrorCategory::from_anyhow(&err), ErrorCategory::Internal);
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCategory::Protocol.to_string(), "protocol error");
    }
}
