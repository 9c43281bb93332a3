//! Error types and handling for tanuki-core operations.
//!
//! Every stage of the search pipeline reports failures through the single
//! [`Error`] type defined here. Errors are categorized so callers can decide
//! what to do with them, and they carry a recoverability hint that the
//! [`RetryPolicy`](crate::RetryPolicy) consults before retrying a fetch.
//!
//! ## Error Categories
//!
//! - **Transient**: rate limits, server errors, dropped connections
//! - **Authentication**: missing or rejected credentials
//! - **Not found**: a group or project vanished mid-enumeration
//! - **Malformed response**: a payload or pagination header that cannot be understood
//! - **Configuration**: invalid settings, unreadable config files
//!
//! ## Recovery Hints
//!
//! ```rust
//! use tanuki_core::Error;
//!
//! let err = Error::Transient("HTTP 503 from /api/v4/groups".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "transient");
//!
//! let err = Error::Authentication("401 Unauthorized".to_string());
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

/// The main error type for tanuki-core operations.
///
/// Termination of a paginated sequence is never reported through this type;
/// pagers and stages signal completion with `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    /// Temporary failure reported by the remote service.
    ///
    /// Covers HTTP 429 and 5xx responses. Retrying after a delay may succeed.
    #[error("Transient error: {0}")]
    Transient(String),

    /// Network operation failed before a response was received.
    ///
    /// The underlying `reqwest::Error` is preserved. Connection failures and
    /// timeouts are recoverable; other transport errors are not.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The credential is missing, invalid or lacks the required scope.
    ///
    /// Always fatal: no retry, and branch isolation does not swallow it.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A group or project could not be found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The remote service answered with something that cannot be interpreted.
    ///
    /// ## Common Causes
    ///
    /// - Response body is not the expected JSON shape
    /// - Pagination header is not a number
    /// - A pagination cursor that does not advance
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Paging or pipeline options were rejected.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// URL is malformed or cannot be joined with an API path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A pipeline worker stopped without reporting a result.
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tanuki_core::Error;
    ///
    /// assert!(Error::Transient("429 Too Many Requests".into()).is_recoverable());
    /// assert!(!Error::NotFound("group 7".into()).is_recoverable());
    /// assert!(!Error::MalformedResponse("not json".into()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Transient(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Whether the error must abort the whole pipeline regardless of the
    /// configured failure policy.
    #[must_use]
    pub const fn is_always_fatal(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_) | Self::Config(_) | Self::InvalidOptions(_)
        )
    }

    /// Get the error category as a string identifier.
    ///
    /// - `"transient"` - rate limits and server-side failures
    /// - `"network"` - transport failures
    /// - `"auth"` - authentication and authorization
    /// - `"not_found"` - missing groups or projects
    /// - `"malformed"` - unexpected payloads or pagination data
    /// - `"config"` - configuration and options
    /// - `"invalid_url"` - URL format and validation
    /// - `"io"` - file system operations
    /// - `"serialization"` - data format conversion
    /// - `"worker"` - pipeline worker failures
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Network(_) => "network",
            Self::Authentication(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::MalformedResponse(_) => "malformed",
            Self::Config(_) | Self::InvalidOptions(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Worker(_) => "worker",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
