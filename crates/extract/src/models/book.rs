use time::Date;

use super::{Audiobook, BookKey, Curation, Isbn, SeriesPosition, clean, clean_list, clean_opt};
use crate::error::{ErrorKind, Result};

/// A catalogued book.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Book {
    pub title: String,
    /// Display order preserved
    pub authors: Vec<String>,
    pub isbn_10: Option<Isbn>,
    pub isbn_13: Option<Isbn>,
    pub series: Option<SeriesPosition>,
    pub year_published: Option<i32>,
    /// Multiple publishers are joined with `", "`
    pub publisher: Option<String>,
    pub page_count: Option<u32>,
    /// Average rating reported by the source, 0 to 5
    pub rating: Option<f32>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub curation: Curation,
    /// `None` until an audiobook check has been run
    pub audiobook: Option<Audiobook>,
    /// Date the source-owned fields were last fetched
    pub last_updated: Option<Date>,
}

impl Book {
    /// A book with only a title and authors; every other field empty.
    ///
    /// The title is cleaned and must not be empty.
    pub fn new(title: impl AsRef<str>, authors: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Self> {
        let title = clean(title);
        if title.is_empty() {
            exn::bail!(ErrorKind::MissingField("title"));
        }
        Ok(Self {
            title,
            authors: clean_list(authors),
            isbn_10: None,
            isbn_13: None,
            series: None,
            year_published: None,
            publisher: None,
            page_count: None,
            rating: None,
            description: None,
            tags: Vec::new(),
            curation: Curation::default(),
            audiobook: None,
            last_updated: None,
        })
    }

    pub fn key(&self) -> BookKey {
        BookKey::new(&self.title, self.primary_author())
    }

    pub fn primary_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// Authors joined for display (`"A, B"`).
    pub fn author_display(&self) -> String {
        self.authors.join(", ")
    }

    /// Record an ISBN in whichever slot matches its kind. An ISBN-10 also
    /// fills the ISBN-13 slot when that one is empty.
    pub fn set_isbn(&mut self, isbn: Isbn) {
        match isbn.kind() {
            super::IsbnKind::Isbn10 => {
                if self.isbn_13.is_none() {
                    self.isbn_13 = Some(isbn.to_isbn13());
                }
                self.isbn_10 = Some(isbn);
            },
            super::IsbnKind::Isbn13 => self.isbn_13 = Some(isbn),
        }
    }

    /// Publisher list joined into the single stored column.
    pub fn set_publishers(&mut self, publishers: impl IntoIterator<Item = impl AsRef<str>>) {
        let publishers = clean_list(publishers);
        self.publisher = clean_opt(Some(publishers.join(", ")));
    }

    pub fn with_last_updated(mut self, date: Date) -> Self {
        self.last_updated = Some(date);
        self
    }

    /// Merge freshly fetched metadata into a stored record.
    ///
    /// Source-owned fields take the fetched value when it is present; an
    /// absent fetched value never erases a stored one. Title and authors keep
    /// the stored spelling so the record's key doesn't drift. Curation and the
    /// audiobook check always come from the stored record. A non-empty fetched
    /// tag list replaces the stored one.
    pub fn merge_fetched(self, fetched: Book) -> Book {
        let authors = match self.authors.is_empty() {
            true => fetched.authors,
            false => self.authors,
        };
        let description = clean_opt(fetched.description.as_deref()).or(self.description);
        Book {
            title: self.title,
            authors,
            isbn_10: fetched.isbn_10.or(self.isbn_10),
            isbn_13: fetched.isbn_13.or(self.isbn_13),
            series: fetched.series.or(self.series),
            year_published: fetched.year_published.or(self.year_published),
            publisher: clean_opt(fetched.publisher.as_deref()).or(self.publisher),
            page_count: fetched.page_count.filter(|p| *p > 0).or(self.page_count),
            rating: fetched.rating.or(self.rating),
            description,
            tags: match clean_list(&fetched.tags) {
                tags if tags.is_empty() => self.tags,
                tags => tags,
            },
            curation: self.curation,
            audiobook: self.audiobook,
            last_updated: fetched.last_updated.or(self.last_updated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, SpiceLevel};
    use time::macros::date;

    fn stored() -> Book {
        let mut book = Book::new("Icebreaker", ["Hannah Grace"]).unwrap();
        book.publisher = Some("Atria".to_string());
        book.page_count = Some(496);
        book.tags = vec!["Romance".to_string(), "Sports".to_string()];
        book.curation.spice_level = Some(SpiceLevel::from_half_steps(8).unwrap());
        book.curation.subgenre = Some("Sports Romance".to_string());
        book.audiobook = Some(Audiobook::unavailable(date!(2024 - 01 - 01)));
        book.last_updated = Some(date!(2024 - 01 - 01));
        book
    }

    #[test]
    fn test_new_rejects_blank_title() {
        assert!(Book::new("   ", ["Someone"]).is_err());
    }

    #[test]
    fn test_key_uses_first_author() {
        let book = Book::new("Icebreaker", ["Hannah Grace", "Someone Else"]).unwrap();
        assert_eq!(book.key(), BookKey::new("icebreaker", Some("hannah grace")));
    }

    #[test]
    fn test_set_isbn_fills_both_slots() {
        let mut book = Book::new("X", ["Y"]).unwrap();
        book.set_isbn(Isbn::parse("0-306-40615-2").unwrap());
        assert_eq!(book.isbn_10.as_ref().map(Isbn::as_str), Some("0306406152"));
        assert_eq!(book.isbn_13.as_ref().map(Isbn::as_str), Some("9780306406157"));
    }

    #[test]
    fn test_merge_keeps_curation_and_never_erases() {
        let mut fetched = Book::new("ICEBREAKER", ["hannah grace"]).unwrap();
        fetched.page_count = Some(512);
        fetched.description = Some("New blurb".to_string());
        fetched.tags = vec!["sports".to_string(), "Hockey".to_string()];
        fetched.last_updated = Some(date!(2024 - 06 - 01));

        let merged = stored().merge_fetched(fetched);
        assert_eq!(merged.title, "Icebreaker");
        assert_eq!(merged.authors, vec!["Hannah Grace".to_string()]);
        assert_eq!(merged.page_count, Some(512));
        assert_eq!(merged.publisher.as_deref(), Some("Atria"));
        assert_eq!(merged.description.as_deref(), Some("New blurb"));
        assert_eq!(merged.tags, vec!["sports".to_string(), "Hockey".to_string()]);
        assert_eq!(merged.curation.subgenre.as_deref(), Some("Sports Romance"));
        assert_eq!(merged.audiobook.map(|a| a.status), Some(Availability::Unavailable));
        assert_eq!(merged.last_updated, Some(date!(2024 - 06 - 01)));
    }

    #[test]
    fn test_merge_replaces_tags_only_when_fetched_has_some() {
        let mut fetched = Book::new("Icebreaker", ["Hannah Grace"]).unwrap();
        fetched.tags = vec!["Horror".to_string()];
        assert_eq!(stored().merge_fetched(fetched.clone()).tags, vec!["Horror".to_string()]);
        fetched.tags = vec!["  ".to_string()];
        assert_eq!(
            stored().merge_fetched(fetched).tags,
            vec!["Romance".to_string(), "Sports".to_string()]
        );
    }

    #[test]
    fn test_merge_takes_authors_when_stored_has_none() {
        let stored = Book::new("Untitled", Vec::<String>::new()).unwrap();
        let fetched = Book::new("Untitled", ["Found Author"]).unwrap();
        assert_eq!(stored.merge_fetched(fetched).authors, vec!["Found Author".to_string()]);
    }
}
