//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. See `ERRORS.md` for design rationale.

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, connect, TLS, timeout, body read).
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The server answered with a 5xx status.
    #[display("server error (HTTP {_0})")]
    ServerError(#[error(not(source))] u16),
    /// The site refused automated access (HTTP 403/429); a real browser may still get through.
    #[display("access refused by the site (HTTP {_0}); try importing in browser mode")]
    Blocked(#[error(not(source))] u16),
    /// Any other non-success status, such as a 404.
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    #[display("Chrome did not finish rendering within {_0}ms")]
    ChromeTimeout(#[error(not(source))] u64),
    /// Chrome could not be launched or lost the page; carries Chrome's own explanation.
    #[display("Chrome failed: {_0}")]
    ChromeFailed(#[error(not(source))] String),
    /// The page rendered to an empty document.
    #[display("Chrome produced an empty document")]
    EmptyRender,
    /// The headless strategy was requested but cannot run here.
    #[display("browser rendering unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ServerError(_))
    }
}
