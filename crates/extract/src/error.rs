//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. See `ERRORS.md` for design rationale.
//!
//! Extraction itself never fails: a missing or malformed signal is simply no
//! contribution. The only fallible step is compiling a site heuristic from its
//! landmark table.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A landmark table produced a pattern that does not compile.
    #[display("invalid landmark pattern for site heuristic '{heuristic}': {reason}")]
    InvalidLandmarks {
        heuristic: String,
        reason: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Landmark tables are static; compiling them again gives the same result.
        false
    }
}
