//! Error types for gleaner operations.
//!
//! Two layers live here. [`FetchError`] is the single terminal failure the
//! fetch engine surfaces after its retry loop has given up, tagged with a
//! [`FetchErrorKind`], the number of attempts made and the last HTTP status
//! seen. [`GleanerError`] is the crate-wide error used by everything else:
//! local input, configuration, output rendering, and the per-facet
//! degradation that the extractor logs but never propagates.
//!
//! # Example
//!
//! ```rust
//! use gleaner_core::{FetchError, FetchErrorKind};
//!
//! let err = FetchError::new(FetchErrorKind::ServerError, 3, Some(500), "HTTP 500");
//! assert!(err.to_string().starts_with("could not retrieve content (server error)"));
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Classification of a terminal fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// The URL was empty or did not use the `http`/`https` scheme. Never retried.
    InvalidUrl,
    /// The server answered with a success status but a blank body on every attempt.
    EmptyResponse,
    /// 429, or 403 with a `Retry-After` header, until retries ran out.
    RateLimited,
    /// 5xx until retries ran out.
    ServerError,
    /// 404, 401 or a bare 403 (terminal), or another 4xx until retries ran out.
    ClientError,
    /// The request exceeded the connect or total timeout.
    Timeout,
    /// Connection reset, DNS failure, TLS failure and similar.
    TransportError,
    /// A status outside the documented policy (1xx/3xx) until retries ran out.
    UnexpectedStatus,
    /// The caller cancelled the retry loop.
    Cancelled,
}

impl FetchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid url",
            Self::EmptyResponse => "empty response",
            Self::RateLimited => "rate limited",
            Self::ServerError => "server error",
            Self::ClientError => "client error",
            Self::Timeout => "timeout",
            Self::TransportError => "transport error",
            Self::UnexpectedStatus => "unexpected status",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a fetch.
///
/// Carries everything a caller needs without inspecting individual attempts:
/// the failure kind, how many requests were issued, and the last HTTP status
/// observed (if any response arrived at all).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not retrieve content ({kind}) after {attempts} attempt(s): {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub attempts: u32,
    pub last_status: Option<u16>,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, attempts: u32, last_status: Option<u16>, message: impl Into<String>) -> Self {
        Self { kind, attempts, last_status, message: message.into() }
    }

    /// Precondition failure: nothing was sent.
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::InvalidUrl, 0, None, message)
    }
}

/// Main error type for gleaner operations.
///
/// # Example
///
/// ```rust
/// use gleaner_core::GleanerError;
///
/// let err = GleanerError::ConfigError("api key is required".to_string());
/// assert!(err.to_string().contains("api key"));
/// ```
#[derive(Error, Debug)]
pub enum GleanerError {
    /// The fetch engine gave up.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// File not found.
    ///
    /// Returned when attempting to read a markup file that doesn't exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O failure: {0}")]
    WriteError(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A record could not be rendered.
    #[error("Failed to serialize output: {0}")]
    SerializeError(String),

    /// A CSS selector failed to compile.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// One extraction facet failed and was reduced to its empty value.
    ///
    /// Only ever logged by the extractor; it never escapes [`crate::extract`].
    #[error("Extraction of {facet} degraded: {reason}")]
    ParseDegraded { facet: &'static str, reason: String },

    /// Every facet of the extracted record is empty.
    #[error("no usable content found")]
    NoUsableContent,
}

impl From<serde_json::Error> for GleanerError {
    fn from(err: serde_json::Error) -> Self {
        GleanerError::SerializeError(err.to_string())
    }
}

/// Result type alias for GleanerError.
pub type Result<T> = std::result::Result<T, GleanerError>;
