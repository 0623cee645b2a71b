//! Application Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the catalog")]
    Database,
    #[display("catalog operation failed")]
    Catalog,
    #[display("could not set up sources")]
    Source,
    /// A library operation failed; the child error says why.
    #[display("{_0} failed")]
    Command(#[error(not(source))] &'static str),
    #[display("no catalogued book {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("nothing to {_0}")]
    NothingToDo(#[error(not(source))] &'static str),
    #[display("could not write output")]
    Output,
}

/// Render an error tree (from this crate or any library crate) for the
/// terminal.
pub fn report<E>(err: &exn::Exn<E>) -> miette::Report
where
    E: std::error::Error + Send + Sync + 'static,
{
    miette::miette!("{err:?}")
}
