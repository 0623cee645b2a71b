use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration file or environment could not be read or decoded.
    #[display("could not load configuration")]
    Load,
    /// A value was read but is out of range.
    #[display("invalid configuration value: {_0}")]
    Invalid(#[error(not(source))] &'static str),
    /// No home directory to derive default paths from.
    #[display("could not determine a home directory for default paths")]
    NoHomeDir,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
