//! Where book data comes from.
//!
//! Each kind of source is a trait so that the library can be driven by the
//! real HTTP clients or by [`MockSource`] in tests. Implementations decode
//! with `picklelit-extract` and never touch the catalog.

mod audible;
pub mod error;
mod google_books;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod open_library;

use std::sync::Arc;

use async_trait::async_trait;
use picklelit_extract::models::Audiobook;
use picklelit_extract::{Book, EditionSummary, SubjectPage};

pub use crate::audible::AudibleCatalog;
use crate::error::Result;
pub use crate::google_books::GoogleBooks;
pub use crate::http::HttpClient;
#[cfg(feature = "mock")]
pub use crate::mock::MockSource;
pub use crate::open_library::OpenLibrary;

pub type MetadataHandle = Arc<dyn MetadataSource + Send + Sync>;
pub type SubjectHandle = Arc<dyn SubjectSource + Send + Sync>;
pub type AudiobookHandle = Arc<dyn AudiobookSource + Send + Sync>;

/// Looks up a single book's metadata by title.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Name of the source, for logging.
    fn name(&self) -> &str;

    /// Best match for `title`, or `Ok(None)` if the source has nothing.
    async fn search_title(&self, title: &str) -> Result<Option<Book>>;
}

/// Lists works filed under a subject and summarizes their editions.
#[async_trait]
pub trait SubjectSource: Send + Sync {
    fn name(&self) -> &str;

    async fn list_subject(&self, subject: &str, offset: u32, limit: u32) -> Result<SubjectPage>;

    /// Summarize up to `limit` editions of the work at `work_key`
    /// (`/works/OL...W`).
    async fn editions(&self, work_key: &str, limit: u32) -> Result<EditionSummary>;
}

/// Checks whether a book has an audiobook edition.
#[async_trait]
pub trait AudiobookSource: Send + Sync {
    fn name(&self) -> &str;

    /// The result is stamped with the date of the check. A book with no
    /// audiobook is `Ok` with [`Availability::Unavailable`](picklelit_extract::models::Availability).
    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<Audiobook>;
}
