//! Google Books `volumes` search responses.

use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::html::description_to_markdown;
use crate::models::{Book, Isbn, clean_list};
use crate::parse_year;

#[derive(Debug, Deserialize)]
struct Volumes {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    title: Option<String>,
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    industry_identifiers: Vec<Identifier>,
    page_count: Option<u32>,
    categories: Vec<String>,
    average_rating: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct Identifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

/// Decode a `volumes?q=...` response into its first book.
///
/// `Ok(None)` means the search ran and matched nothing.
#[instrument(level = "debug", skip(json), fields(json_size = json.len()))]
pub fn parse_volumes(json: &str) -> Result<Option<Book>> {
    let volumes: Volumes = serde_json::from_str(json).or_raise(|| ErrorKind::InvalidPayload("google books"))?;
    let Some(volume) = volumes.items.into_iter().next() else {
        tracing::debug!("no volumes in response");
        return Ok(None);
    };
    volume.volume_info.into_book().map(Some)
}

impl VolumeInfo {
    fn into_book(self) -> Result<Book> {
        let title = self.title.ok_or_raise(|| ErrorKind::MissingField("volumeInfo.title"))?;
        let mut book = Book::new(title, self.authors)?;
        for identifier in self.industry_identifiers {
            if !matches!(identifier.kind.as_str(), "ISBN_10" | "ISBN_13") {
                continue;
            }
            match Isbn::parse(&identifier.identifier) {
                Ok(isbn) => book.set_isbn(isbn),
                Err(_) => tracing::debug!(identifier = %identifier.identifier, "ignoring invalid isbn"),
            }
        }
        book.year_published = self.published_date.as_deref().and_then(parse_year);
        book.set_publishers(self.publisher);
        book.page_count = self.page_count.filter(|p| *p > 0);
        book.rating = self.average_rating.filter(|r| (0.0..=5.0).contains(r));
        book.description = self.description.as_deref().and_then(description_to_markdown);
        book.tags = clean_list(self.categories.iter().flat_map(|c| c.split('/')));
        Ok(book)
    }
}
