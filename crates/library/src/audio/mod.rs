//! Audiobook checks.
//!
//! A check asks the audiobook source about one book and writes the answer
//! (available or not, narrators, runtime, store link and the date of the
//! check) back to the catalog. Metadata freshness is untouched.
//!
//! The primary entry point is [`refresh_audiobooks`], which streams checks
//! for every book whose last check is stale.

mod book;
mod stream;

pub use self::book::check_audiobook;
pub use self::stream::{AudioEvent, refresh_audiobooks};
