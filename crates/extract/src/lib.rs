pub mod audible;
mod consts;
pub mod error;
pub mod google_books;
mod html;
pub mod models;
pub mod open_library;

use crate::consts::YEAR_REGEX;
pub use crate::html::description_to_markdown;
pub use crate::models::Book;
pub use crate::open_library::{EditionSummary, SubjectPage, SubjectWork};

/// Leading four-digit year of a `YYYY`, `YYYY-MM` or `YYYY-MM-DD` date.
pub fn parse_year(raw: &str) -> Option<i32> {
    YEAR_REGEX
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .and_then(|year| year.as_str().parse().ok())
}
