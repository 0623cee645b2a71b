//! Source Error Types
//!
//! Absence is not an error here: a source that answered and matched nothing
//! returns `Ok(None)` or an unavailable audiobook. Everything in this module
//! means the question could not be answered.

use derive_more::{Display, Error};
use picklelit_extract::error::{Error as ExtractError, ErrorKind as ExtractErrorKind};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection, TLS or protocol failure
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// No response within the configured timeout
    #[display("request timed out")]
    Timeout,
    /// The source answered with a non-success status
    #[display("source responded with HTTP {_0}")]
    Status(#[error(not(source))] u16),
    /// The response body was not what the source normally sends
    #[display("could not decode source response: {_0}")]
    Decode(ExtractErrorKind),
    /// The request could not be built (bad base URL, empty query)
    #[display("invalid request: {_0}")]
    InvalidRequest(#[error(not(source))] String),
}

impl ErrorKind {
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if let Some(status) = err.status() {
            return Self::Status(status.as_u16());
        }
        if err.is_builder() {
            return Self::InvalidRequest(err.to_string());
        }
        Self::Network(err.to_string())
    }

    /// Wrap a decode failure, keeping the extract crate's error tree as a child.
    #[track_caller]
    pub fn decode(err: ExtractError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Decode(inner))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status(status) => *status == 429 || *status == 408 || (500..600).contains(status),
            Self::Decode(_) | Self::InvalidRequest(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Timeout, true)]
    #[case(ErrorKind::Network("reset".to_string()), true)]
    #[case(ErrorKind::Status(429), true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::Status(403), false)]
    #[case(ErrorKind::InvalidRequest("empty title".to_string()), false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
