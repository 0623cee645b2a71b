use std::fmt::{Display, Formatter, Result as FmtResult};

use super::clean;

/// Canonical identity of a book in the catalog.
///
/// Two records describe the same book when their case-folded,
/// whitespace-collapsed title and first author are equal. ISBNs are not part
/// of the identity: editions of the same work carry different ISBNs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookKey {
    title: String,
    author: String,
}
impl BookKey {
    pub fn new(title: impl AsRef<str>, author: Option<impl AsRef<str>>) -> Self {
        Self {
            title: Self::normalize(title.as_ref()),
            author: author.map(|a| Self::normalize(a.as_ref())).unwrap_or_default(),
        }
    }

    /// Fold a name the way key parts are folded: whitespace collapsed and
    /// lowercased (Unicode-aware).
    pub fn normalize(value: &str) -> String {
        clean(value).to_lowercase()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

impl Display for BookKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.author.is_empty() {
            true => write!(f, "{}", self.title),
            false => write!(f, "{} by {}", self.title, self.author),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let a = BookKey::new("  The Love  Hypothesis ", Some("Ali Hazelwood"));
        let b = BookKey::new("the love hypothesis", Some("ALI   HAZELWOOD"));
        assert_eq!(a, b);
        assert_eq!(a.title(), "the love hypothesis");
        assert_eq!(a.author(), "ali hazelwood");
    }

    #[test]
    fn test_missing_author_is_empty() {
        let key = BookKey::new("Anonymous", None::<&str>);
        assert_eq!(key.author(), "");
        assert_eq!(key.to_string(), "anonymous");
    }
}
