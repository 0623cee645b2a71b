//! Library Error Types
//!
//! Catalog and source failures are wrapped into this crate's kinds, keeping
//! the inner error tree as a child. Streams wrap per-book failures once more
//! with the book they happened to, and keep going.

use derive_more::{Display, Error};
use picklelit_extract::models::BookKey;
use picklelit_source::error::{Error as SourceError, ErrorKind as SourceErrorKind};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A read or write via [`picklelit_catalog::Repository`] failed.
    #[display("catalog error")]
    Catalog,
    /// A source could not answer. Never used for "no result".
    #[display("{_0}")]
    Source(SourceErrorKind),
    /// Rejected before any request was made.
    #[display("invalid input: {_0}")]
    InvalidInput(#[error(not(source))] &'static str),
    #[display("audiobook check failed for {_0}")]
    Audiobook(#[error(not(source))] BookKey),
    #[display("could not catalog discovered work {_0}")]
    Discover(#[error(not(source))] String),
}

impl ErrorKind {
    /// Convert a source error into a library error, preserving the source
    /// crate's error tree as a child.
    #[track_caller]
    pub fn source(err: SourceError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Source(inner))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source(kind) => kind.is_retryable(),
            _ => false,
        }
    }
}
