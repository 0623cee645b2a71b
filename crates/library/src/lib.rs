//! Keeping the catalog in sync with its sources.
//!
//! - [`scrape_and_update`] looks one title up, fetching only when the stored
//!   record is missing or stale.
//! - [`audio::refresh_audiobooks`] streams audiobook checks for many books.
//! - [`discover::discover`] streams new books found by paging through a
//!   subject listing.

pub mod audio;
pub mod discover;
pub mod error;
mod scrape;
mod staleness;

use std::time::Duration;

use picklelit_catalog::Repository;
use picklelit_source::{AudiobookHandle, MetadataHandle, SubjectHandle};

pub use crate::scrape::{Outcome, ScrapeOptions, scrape_and_update};
pub use crate::staleness::Staleness;

/// Books checked at the same time when no request delay is configured.
pub const MAX_CONCURRENCY: usize = 8;

/// Everything an operation needs: where books are stored and where they are
/// fetched from.
#[derive(Clone)]
pub struct Context {
    pub catalog: Repository,
    pub metadata: MetadataHandle,
    pub subjects: SubjectHandle,
    pub audiobooks: AudiobookHandle,
    /// Pause between consecutive requests to the same source.
    pub request_delay: Duration,
}

impl Context {
    pub fn new(
        catalog: Repository,
        metadata: MetadataHandle,
        subjects: SubjectHandle,
        audiobooks: AudiobookHandle,
    ) -> Self {
        Self {
            catalog,
            metadata,
            subjects,
            audiobooks,
            request_delay: Duration::ZERO,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub(crate) fn throttle(&self) -> Throttle {
        Throttle { delay: self.request_delay, waited: false }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("catalog", &self.catalog)
            .field("metadata", &self.metadata.name())
            .field("subjects", &self.subjects.name())
            .field("audiobooks", &self.audiobooks.name())
            .field("request_delay", &self.request_delay)
            .finish()
    }
}

/// Spaces out a sequence of requests. The first call returns immediately.
pub(crate) struct Throttle {
    delay: Duration,
    waited: bool,
}

impl Throttle {
    pub(crate) async fn wait(&mut self) {
        if self.waited && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.waited = true;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use picklelit_catalog::{Database, Repository};
    use picklelit_source::MockSource;

    use crate::Context;

    /// A context over an in-memory catalog where every source is `source`.
    pub(crate) async fn context(source: MockSource) -> (Context, Arc<MockSource>, Database) {
        let db = Database::connect_in_memory().await.unwrap();
        let source = Arc::new(source);
        let ctx = Context::new(Repository::from(&db), source.clone(), source.clone(), source.clone());
        (ctx, source, db)
    }
}
