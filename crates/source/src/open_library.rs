use async_trait::async_trait;
use picklelit_extract::open_library::{parse_editions, parse_subject};
use picklelit_extract::{EditionSummary, SubjectPage};
use tracing::instrument;

use crate::SubjectSource;
use crate::error::{ErrorKind, Result};
use crate::http::{HttpClient, join};

/// Open Library subject listings and edition lookups.
#[derive(Debug, Clone)]
pub struct OpenLibrary {
    http: HttpClient,
    base_url: String,
}

impl OpenLibrary {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Subject slugs are lowercase with underscores (`"historical_romance"`).
    fn subject_slug(subject: &str) -> String {
        subject
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[async_trait]
impl SubjectSource for OpenLibrary {
    fn name(&self) -> &str {
        "open-library"
    }

    #[instrument(skip(self), fields(source = self.name()))]
    async fn list_subject(&self, subject: &str, offset: u32, limit: u32) -> Result<SubjectPage> {
        let slug = Self::subject_slug(subject);
        if slug.is_empty() || slug.contains('/') {
            exn::bail!(ErrorKind::InvalidRequest(format!("invalid subject: {subject:?}")));
        }
        let url = join(&self.base_url, &format!("subjects/{slug}.json"));
        let (offset, limit) = (offset.to_string(), limit.to_string());
        let body = self.http.get_text(&url, &[("limit", limit.as_str()), ("offset", offset.as_str())]).await?;
        parse_subject(&body).map_err(ErrorKind::decode)
    }

    #[instrument(skip(self), fields(source = self.name()))]
    async fn editions(&self, work_key: &str, limit: u32) -> Result<EditionSummary> {
        if !work_key.starts_with("/works/") {
            exn::bail!(ErrorKind::InvalidRequest(format!("not a work key: {work_key:?}")));
        }
        let url = join(&self.base_url, &format!("{work_key}/editions.json"));
        let limit = limit.to_string();
        let body = self.http.get_text(&url, &[("limit", limit.as_str())]).await?;
        parse_editions(&body).map_err(ErrorKind::decode)
    }
}
