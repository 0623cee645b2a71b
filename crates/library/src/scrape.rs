use exn::ResultExt;
use picklelit_extract::Book;
use tracing::instrument;

use crate::audio::check_audiobook;
use crate::error::{ErrorKind, Result};
use crate::staleness::today;
use crate::{Context, Staleness};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeOptions {
    pub staleness: Staleness,
    /// Also check the audiobook source for any book that gets written.
    pub with_audiobook: bool,
}

/// What [`scrape_and_update`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A fresh record was already catalogued. No request was made.
    Fresh(Book),
    /// A stale (or differently titled) record was merged with fetched data.
    Refreshed(Book),
    /// The record is stale but the source no longer knows the title. The
    /// stored record is unchanged.
    NoChange(Book),
    /// A new record was fetched and catalogued.
    Added(Book),
    /// Nothing catalogued and the source has no match.
    NotFound,
}

impl Outcome {
    pub fn book(&self) -> Option<&Book> {
        match self {
            Self::Fresh(book) | Self::Refreshed(book) | Self::NoChange(book) | Self::Added(book) => Some(book),
            Self::NotFound => None,
        }
    }
}

/// Make sure the catalog holds up to date metadata for `title`.
///
/// The most recently updated catalog entry whose title contains `title` is the
/// match. A fresh match is returned as-is without any request. Otherwise the
/// metadata source is asked, and the answer is merged into the match (if any)
/// and upserted.
///
/// # Errors
/// A source that can't answer is an error, never [`Outcome::NotFound`].
#[instrument(skip(ctx))]
pub async fn scrape_and_update(ctx: &Context, title: &str, options: ScrapeOptions) -> Result<Outcome> {
    let title = title.trim();
    if title.is_empty() {
        exn::bail!(ErrorKind::InvalidInput("title"));
    }
    let today = today();
    let existing = ctx
        .catalog
        .find_by_title(title)
        .await
        .or_raise(|| ErrorKind::Catalog)?
        .into_iter()
        .next();
    if let Some(book) = existing.as_ref().filter(|b| !options.staleness.is_stale(b.last_updated, today)) {
        tracing::debug!(key = %book.key(), "catalogued record is fresh");
        return Ok(Outcome::Fresh(book.clone()));
    }

    let fetched = ctx.metadata.search_title(title).await.map_err(ErrorKind::source)?;
    let mut outcome = match (existing, fetched) {
        (Some(book), None) => return Ok(Outcome::NoChange(book)),
        (None, None) => return Ok(Outcome::NotFound),
        (Some(book), Some(fetched)) if book.key() == fetched.key() => {
            Outcome::Refreshed(book.merge_fetched(fetched.with_last_updated(today)))
        },
        // The source's best match may be a book catalogued under another
        // title, or the title search matched a different book.
        (_, Some(fetched)) => match ctx.catalog.get(&fetched.key()).await.or_raise(|| ErrorKind::Catalog)? {
            Some(stored) => Outcome::Refreshed(stored.merge_fetched(fetched.with_last_updated(today))),
            None => Outcome::Added(fetched.with_last_updated(today)),
        },
    };

    if let Outcome::Refreshed(book) | Outcome::Added(book) = &mut outcome {
        ctx.catalog.upsert(book).await.or_raise(|| ErrorKind::Catalog)?;
        tracing::info!(key = %book.key(), "book metadata saved");
        if options.with_audiobook {
            book.audiobook = Some(check_audiobook(ctx, book).await?);
        }
    }
    Ok(outcome)
}
