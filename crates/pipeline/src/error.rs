//! Pipeline Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. See `ERRORS.md` for design rationale.
//!
//! Only these kinds leave the pipeline. Failures inside extractors and the
//! diagnostics writer are absorbed where they happen.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An import error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not an absolute `http`/`https` URL with a host.
    #[display("invalid URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The page could not be downloaded.
    #[display("could not fetch the page: {_0}")]
    Fetch(#[error(not(source))] String),
    /// Browser rendering failed, or is unavailable when explicitly requested.
    #[display("could not render the page in a browser: {_0}")]
    Render(#[error(not(source))] String),
    /// The page was fetched but is not a single posting.
    #[display(
        "the page is not a job posting detail (probably a listing, an SEO page, a consent page or content loaded by JavaScript); \
         use the URL of a single posting or import in browser mode. Dump: {}",
        _0.as_ref().map_or_else(|| "(none)".to_string(), |path| path.display().to_string())
    )]
    UnsupportedPage(#[error(not(source))] Option<PathBuf>),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    /// Returns `true` if an import in browser mode might succeed where this one failed.
    pub fn suggests_browser(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::UnsupportedPage(_))
    }
}
