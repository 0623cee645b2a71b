//! In-memory sources for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use picklelit_extract::models::Audiobook;
use picklelit_extract::{Book, EditionSummary, SubjectPage, SubjectWork};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{ErrorKind, Result};
use crate::{AudiobookSource, MetadataSource, SubjectSource};

/// Canned responses for every source trait, keyed case-insensitively by
/// title (or by subject name and work key).
///
/// Unknown titles are "not found": `Ok(None)` for metadata and an unavailable
/// audiobook for lookups. Titles registered with
/// [`failing_title()`](Self::failing_title) fail with a network error
/// instead, for every trait. Every call is counted.
///
/// # Examples
///
/// ```
/// use picklelit_extract::Book;
/// use picklelit_source::{MetadataSource, MockSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let source = MockSource::default().with_book(Book::new("Icebreaker", ["Hannah Grace"]).unwrap());
/// assert!(source.search_title("icebreaker").await.unwrap().is_some());
/// assert!(source.search_title("Unknown").await.unwrap().is_none());
/// assert_eq!(source.metadata_calls(), 2);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockSource {
    books: RwLock<HashMap<String, Book>>,
    subjects: RwLock<HashMap<String, Vec<SubjectWork>>>,
    editions: RwLock<HashMap<String, EditionSummary>>,
    audiobooks: RwLock<HashMap<String, Audiobook>>,
    failing: RwLock<HashSet<String>>,
    metadata_calls: AtomicUsize,
    subject_calls: AtomicUsize,
    audio_calls: AtomicUsize,
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

impl MockSource {
    pub fn with_book(mut self, book: Book) -> Self {
        self.books.get_mut().insert(fold(&book.title), book);
        self
    }

    pub fn with_subject(mut self, subject: &str, works: impl IntoIterator<Item = SubjectWork>) -> Self {
        self.subjects.get_mut().insert(fold(subject), works.into_iter().collect());
        self
    }

    pub fn with_editions(mut self, work_key: &str, editions: EditionSummary) -> Self {
        self.editions.get_mut().insert(work_key.to_string(), editions);
        self
    }

    pub fn with_audiobook(mut self, title: &str, audiobook: Audiobook) -> Self {
        self.audiobooks.get_mut().insert(fold(title), audiobook);
        self
    }

    /// Requests mentioning this title (or work key) fail with a network error.
    pub fn failing_title(mut self, title: &str) -> Self {
        self.failing.get_mut().insert(fold(title));
        self
    }

    /// Replace the canned metadata for a title while the mock is shared.
    pub async fn set_book(&self, book: Book) {
        self.books.write().await.insert(fold(&book.title), book);
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn subject_calls(&self) -> usize {
        self.subject_calls.load(Ordering::SeqCst)
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }

    async fn check_failing(&self, key: &str) -> Result<()> {
        if self.failing.read().await.contains(&fold(key)) {
            exn::bail!(ErrorKind::Network(format!("mock failure for {key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_title(&self, title: &str) -> Result<Option<Book>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing(title).await?;
        Ok(self.books.read().await.get(&fold(title)).cloned())
    }
}

#[async_trait]
impl SubjectSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_subject(&self, subject: &str, offset: u32, limit: u32) -> Result<SubjectPage> {
        self.subject_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing(subject).await?;
        let subjects = self.subjects.read().await;
        let all = subjects.get(&fold(subject)).map(Vec::as_slice).unwrap_or_default();
        let works = all
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(SubjectPage {
            name: fold(subject),
            work_count: u64::try_from(all.len()).unwrap_or(0),
            works,
        })
    }

    async fn editions(&self, work_key: &str, _limit: u32) -> Result<EditionSummary> {
        self.subject_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing(work_key).await?;
        Ok(self.editions.read().await.get(work_key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl AudiobookSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup(&self, title: &str, _author: Option<&str>) -> Result<Audiobook> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing(title).await?;
        let today = OffsetDateTime::now_utc().date();
        Ok(self
            .audiobooks
            .read()
            .await
            .get(&fold(title))
            .cloned()
            .unwrap_or_else(|| Audiobook::unavailable(today)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picklelit_extract::models::Availability;

    fn work(n: usize) -> SubjectWork {
        SubjectWork {
            key: format!("/works/OL{n}W"),
            title: format!("Work {n}"),
            author: Some("Author".to_string()),
            first_publish_year: Some(2010),
            subjects: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_subject_paging() {
        let source = MockSource::default().with_subject("Romance", (0..5).map(work));
        let page = source.list_subject("romance", 3, 10).await.unwrap();
        assert_eq!(page.work_count, 5);
        assert_eq!(page.works.len(), 2);
        assert_eq!(page.works[0].title, "Work 3");
        assert!(source.list_subject("horror", 0, 10).await.unwrap().works.is_empty());
        assert_eq!(source.subject_calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_title_is_error() {
        let source = MockSource::default().failing_title("Broken");
        let err = source.search_title("broken").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(source.lookup("Broken", None).await.is_err());
        let audiobook = source.lookup("Fine", None).await.unwrap();
        assert_eq!(audiobook.status, Availability::Unavailable);
    }
}
