mod audiobook;
mod book;
mod curation;
mod isbn;
mod key;
mod series;
mod spice;

pub use self::audiobook::{Audiobook, Availability, Runtime};
pub use self::book::Book;
pub use self::curation::{Curation, CurationPatch, GraphicAudio};
pub use self::isbn::{Isbn, IsbnKind};
pub use self::key::BookKey;
pub use self::series::SeriesPosition;
pub use self::spice::SpiceLevel;

use crate::consts::WHITESPACE_REGEX;

/// Trim and collapse internal whitespace runs to a single space.
pub(crate) fn clean(s: impl AsRef<str>) -> String {
    WHITESPACE_REGEX.replace_all(s.as_ref().trim(), " ").into_owned()
}

/// Like [`clean`], but empty results become `None`.
pub(crate) fn clean_opt(s: Option<impl AsRef<str>>) -> Option<String> {
    s.map(clean).filter(|s| !s.is_empty())
}

/// Clean every entry, drop empties and drop duplicates (first occurrence wins).
pub(crate) fn clean_list(items: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = clean(item);
        if !item.is_empty() && !out.iter().any(|existing| existing.eq_ignore_ascii_case(&item)) {
            out.push(item);
        }
    }
    out
}
