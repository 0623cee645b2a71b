use async_trait::async_trait;
use picklelit_extract::Book;
use picklelit_extract::google_books::parse_volumes;
use tracing::instrument;

use crate::MetadataSource;
use crate::error::{ErrorKind, Result};
use crate::http::{HttpClient, join};

/// Google Books volume search, by exact title.
#[derive(Debug, Clone)]
pub struct GoogleBooks {
    http: HttpClient,
    base_url: String,
}

impl GoogleBooks {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// The `q` parameter: an exact-phrase title search.
    fn query(title: &str) -> String {
        format!("intitle:\"{}\"", title.replace('"', ""))
    }
}

#[async_trait]
impl MetadataSource for GoogleBooks {
    fn name(&self) -> &str {
        "google-books"
    }

    #[instrument(skip(self), fields(source = self.name()))]
    async fn search_title(&self, title: &str) -> Result<Option<Book>> {
        let title = title.trim();
        if title.is_empty() {
            exn::bail!(ErrorKind::InvalidRequest("empty title".to_string()));
        }
        let url = join(&self.base_url, "volumes");
        let q = Self::query(title);
        let body = self.http.get_text(&url, &[("q", q.as_str()), ("maxResults", "1")]).await?;
        let book = parse_volumes(&body).map_err(ErrorKind::decode)?;
        tracing::debug!(found = book.is_some(), "title search complete");
        Ok(book)
    }
}
