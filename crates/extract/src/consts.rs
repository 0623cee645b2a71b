use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(YEAR_REGEX, r"^\s*(\d{4})(?:$|[-/\s])");
regex!(WHITESPACE_REGEX, r"\s+");
regex!(
    RUNTIME_REGEX,
    r"(?i)^(?:length:\s*)?(?:(\d+)\s*(?:hrs?|hours?))?(?:\s*(?:and\s*)?(\d+)\s*(?:mins?|minutes?))?\s*$"
);
regex!(
    SERIES_REGEX,
    r"(?i)^(.+?)(?:\s*[,;:]?\s*(?:#|\(|\bbook\s+|\bvol(?:ume)?\.?\s*|\bno\.?\s*)(\d{1,3}(?:\.\d)?)\)?)\s*$"
);
regex!(FRACTION_REGEX, r"^\s*(\d(?:\.5)?)\s*/\s*5\s*$");
#[cfg(not(feature = "markdown"))]
regex!(HTML_TAG_REGEX, r"<[^>]*>");

/// Chili pepper glyph used to write spice levels as emoji.
pub(crate) const CHILI: char = '\u{1F336}';
/// Emoji presentation selector that often trails a [`CHILI`].
pub(crate) const VARIATION_SELECTOR: char = '\u{FE0F}';
