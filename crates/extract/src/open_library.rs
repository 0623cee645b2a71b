//! Open Library subject listings and work editions.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use exn::ResultExt;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{Book, Isbn, IsbnKind, SeriesPosition, clean_list, clean_opt};

/// One page of works filed under a subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectPage {
    pub name: String,
    /// Total number of works under the subject, across all pages
    pub work_count: u64,
    pub works: Vec<SubjectWork>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectWork {
    /// Work path, like `/works/OL15358691W`
    pub key: String,
    pub title: String,
    pub author: Option<String>,
    pub first_publish_year: Option<i32>,
    pub subjects: Vec<String>,
}

/// What the editions of a single work agree on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditionSummary {
    /// Every valid ISBN across all editions, first seen first
    pub isbns: Vec<Isbn>,
    /// Most common page count (ties go to the smaller count)
    pub page_count: Option<u32>,
    /// Distinct publishers, first seen first
    pub publishers: Vec<String>,
    /// First series any edition names
    pub series: Option<SeriesPosition>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}
impl OneOrMany {
    fn first(self) -> Option<String> {
        match self {
            Self::One(s) => Some(s),
            Self::Many(v) => v.into_iter().next(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSubject {
    #[serde(default)]
    name: String,
    #[serde(default)]
    work_count: u64,
    #[serde(default)]
    works: Vec<RawWork>,
}

#[derive(Debug, Deserialize)]
struct RawWork {
    key: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
    first_publish_year: Option<i32>,
    #[serde(default)]
    subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEditions {
    #[serde(default)]
    entries: Vec<RawEdition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEdition {
    isbn_10: Vec<String>,
    isbn_13: Vec<String>,
    number_of_pages: Option<u32>,
    publishers: Vec<String>,
    series: Option<OneOrMany>,
}

/// Decode `/subjects/{subject}.json`.
///
/// Works without a key or title can't be looked up or catalogued, so they are
/// dropped here.
#[instrument(level = "debug", skip(json), fields(json_size = json.len()))]
pub fn parse_subject(json: &str) -> Result<SubjectPage> {
    let raw: RawSubject = serde_json::from_str(json).or_raise(|| ErrorKind::InvalidPayload("open library subject"))?;
    let total = raw.works.len();
    let works: Vec<SubjectWork> = raw
        .works
        .into_iter()
        .filter_map(|work| {
            let key = clean_opt(work.key)?;
            let title = clean_opt(work.title)?;
            Some(SubjectWork {
                key,
                title,
                author: clean_opt(work.authors.into_iter().find_map(|a| a.name)),
                first_publish_year: work.first_publish_year,
                subjects: clean_list(work.subject),
            })
        })
        .collect();
    if works.len() < total {
        tracing::debug!(dropped = total - works.len(), "dropped works without key or title");
    }
    Ok(SubjectPage {
        name: raw.name,
        work_count: raw.work_count,
        works,
    })
}

/// Decode `{work_key}/editions.json` into an [`EditionSummary`].
#[instrument(level = "debug", skip(json), fields(json_size = json.len()))]
pub fn parse_editions(json: &str) -> Result<EditionSummary> {
    let raw: RawEditions = serde_json::from_str(json).or_raise(|| ErrorKind::InvalidPayload("open library editions"))?;
    let mut summary = EditionSummary::default();
    let mut page_counts: BTreeMap<u32, usize> = BTreeMap::new();
    let mut publishers: Vec<String> = Vec::new();
    for edition in raw.entries {
        for raw_isbn in edition.isbn_10.iter().chain(edition.isbn_13.iter()) {
            match Isbn::parse(raw_isbn) {
                Ok(isbn) if !summary.isbns.contains(&isbn) => summary.isbns.push(isbn),
                Ok(_) => {},
                Err(_) => tracing::debug!(isbn = %raw_isbn, "ignoring invalid isbn"),
            }
        }
        if let Some(pages) = edition.number_of_pages.filter(|p| *p > 0) {
            *page_counts.entry(pages).or_default() += 1;
        }
        publishers.extend(edition.publishers);
        if summary.series.is_none()
            && let Some(series) = clean_opt(edition.series.and_then(OneOrMany::first))
        {
            summary.series = series.parse().ok();
        }
    }
    summary.page_count = page_counts
        .into_iter()
        .max_by_key(|(pages, count)| (*count, Reverse(*pages)))
        .map(|(pages, _)| pages);
    summary.publishers = clean_list(publishers);
    Ok(summary)
}

impl SubjectWork {
    /// Build a catalog record from the work and its editions. The subject the
    /// work was found under becomes the default subgenre.
    pub fn into_book(self, editions: EditionSummary, subject: &str) -> Result<Book> {
        let mut book = Book::new(self.title, self.author)?;
        book.year_published = self.first_publish_year;
        book.tags = self.subjects;
        for isbn in editions.isbns {
            let slot = match isbn.kind() {
                IsbnKind::Isbn10 => &book.isbn_10,
                IsbnKind::Isbn13 => &book.isbn_13,
            };
            if slot.is_none() {
                book.set_isbn(isbn);
            }
        }
        book.page_count = editions.page_count;
        book.set_publishers(editions.publishers);
        book.series = editions.series;
        book.curation.subgenre = clean_opt(Some(subject));
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBJECT: &str = r#"{
        "key": "/subjects/romance",
        "name": "romance",
        "subject_type": "subject",
        "work_count": 48213,
        "works": [
            {
                "key": "/works/OL17930368W",
                "title": "Twilight",
                "authors": [{"key": "/authors/OL1394359A", "name": "Stephenie Meyer"}],
                "first_publish_year": 2005,
                "subject": ["Vampires", "Fiction", "vampires"]
            },
            {
                "key": "/works/OL66554W",
                "title": "Pride and Prejudice",
                "authors": [{"key": "/authors/OL21594A", "name": "Jane Austen"}],
                "first_publish_year": 1813
            },
            {"key": "/works/OL1W", "authors": []}
        ]
    }"#;

    const EDITIONS: &str = r#"{
        "size": 3,
        "entries": [
            {
                "isbn_10": ["0316015849"],
                "isbn_13": ["9780316015844"],
                "number_of_pages": 498,
                "publishers": ["Little, Brown"],
                "series": ["Twilight saga #1"]
            },
            {
                "isbn_13": ["9780316015844", "9780000000000"],
                "number_of_pages": 544,
                "publishers": ["Little, Brown", "Atom"]
            },
            {
                "number_of_pages": 498,
                "series": "Should not win"
            }
        ]
    }"#;

    #[test]
    fn test_parse_subject() {
        let page = parse_subject(SUBJECT).unwrap();
        assert_eq!(page.name, "romance");
        assert_eq!(page.work_count, 48213);
        assert_eq!(page.works.len(), 2);
        let twilight = &page.works[0];
        assert_eq!(twilight.key, "/works/OL17930368W");
        assert_eq!(twilight.author.as_deref(), Some("Stephenie Meyer"));
        assert_eq!(twilight.first_publish_year, Some(2005));
        assert_eq!(twilight.subjects, vec!["Vampires".to_string(), "Fiction".to_string()]);
        assert!(page.works[1].subjects.is_empty());
    }

    #[test]
    fn test_parse_editions() {
        let summary = parse_editions(EDITIONS).unwrap();
        let isbns: Vec<&str> = summary.isbns.iter().map(Isbn::as_str).collect();
        assert_eq!(isbns, vec!["0316015849", "9780316015844"]);
        assert_eq!(summary.page_count, Some(498));
        assert_eq!(summary.publishers, vec!["Little, Brown".to_string(), "Atom".to_string()]);
        let series = summary.series.unwrap();
        assert_eq!(series.name, "Twilight saga");
        assert_eq!(series.position.as_deref(), Some("1"));
    }

    #[test]
    fn test_page_count_tie_takes_smaller() {
        let json = r#"{"entries": [{"number_of_pages": 320}, {"number_of_pages": 300}]}"#;
        assert_eq!(parse_editions(json).unwrap().page_count, Some(300));
    }

    #[test]
    fn test_empty_editions() {
        assert_eq!(parse_editions(r#"{"entries": []}"#).unwrap(), EditionSummary::default());
        assert!(parse_editions("not json").is_err());
    }

    #[test]
    fn test_into_book() {
        let work = parse_subject(SUBJECT).unwrap().works.remove(0);
        let book = work.into_book(parse_editions(EDITIONS).unwrap(), "romance").unwrap();
        assert_eq!(book.title, "Twilight");
        assert_eq!(book.authors, vec!["Stephenie Meyer".to_string()]);
        assert_eq!(book.year_published, Some(2005));
        assert_eq!(book.isbn_10.as_ref().map(Isbn::as_str), Some("0316015849"));
        assert_eq!(book.isbn_13.as_ref().map(Isbn::as_str), Some("9780316015844"));
        assert_eq!(book.page_count, Some(498));
        assert_eq!(book.publisher.as_deref(), Some("Little, Brown, Atom"));
        assert_eq!(book.curation.subgenre.as_deref(), Some("romance"));
        assert_eq!(book.series.map(|s| s.name), Some("Twilight saga".to_string()));
    }
}
