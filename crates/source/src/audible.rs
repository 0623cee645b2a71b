use async_trait::async_trait;
use picklelit_extract::audible::parse_products;
use picklelit_extract::models::Audiobook;
use time::OffsetDateTime;
use tracing::instrument;

use crate::AudiobookSource;
use crate::error::{ErrorKind, Result};
use crate::http::{HttpClient, join};

const RESPONSE_GROUPS: &str = "contributors,product_attrs,product_desc";

/// Audible's public catalog search.
///
/// `api_base` serves the JSON catalog; `site_base` is where the product pages
/// that end up in [`Audiobook::link`] live.
#[derive(Debug, Clone)]
pub struct AudibleCatalog {
    http: HttpClient,
    api_base: String,
    site_base: String,
}

impl AudibleCatalog {
    pub fn new(http: HttpClient, api_base: impl Into<String>, site_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            site_base: site_base.into(),
        }
    }

    fn keywords(title: &str, author: Option<&str>) -> String {
        match author.map(str::trim).filter(|a| !a.is_empty()) {
            Some(author) => format!("{} {}", title.trim(), author),
            None => title.trim().to_string(),
        }
    }
}

#[async_trait]
impl AudiobookSource for AudibleCatalog {
    fn name(&self) -> &str {
        "audible"
    }

    #[instrument(skip(self), fields(source = self.name()))]
    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<Audiobook> {
        if title.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidRequest("empty title".to_string()));
        }
        let url = join(&self.api_base, "1.0/catalog/products");
        let keywords = Self::keywords(title, author);
        let query = [
            ("keywords", keywords.as_str()),
            ("num_results", "1"),
            ("response_groups", RESPONSE_GROUPS),
        ];
        let body = self.http.get_text(&url, &query).await?;
        let today = OffsetDateTime::now_utc().date();
        let audiobook = parse_products(&body, &self.site_base, today).map_err(ErrorKind::decode)?;
        tracing::debug!(available = audiobook.is_available(), "audiobook lookup complete");
        Ok(audiobook)
    }
}
