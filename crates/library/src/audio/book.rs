use exn::ResultExt;
use picklelit_extract::Book;
use picklelit_extract::models::Audiobook;
use tracing::instrument;

use crate::Context;
use crate::error::{ErrorKind, Result};

/// Check a single book against the audiobook source and record the result.
///
/// An unavailable audiobook is a successful check. A book that is no longer
/// catalogued (or wasn't written because of a dry run) is checked but not
/// recorded.
#[instrument(skip_all, fields(key = %book.key()))]
pub async fn check_audiobook(ctx: &Context, book: &Book) -> Result<Audiobook> {
    let audiobook = ctx
        .audiobooks
        .lookup(&book.title, book.primary_author())
        .await
        .map_err(ErrorKind::source)?;
    let recorded = ctx
        .catalog
        .update_audiobook(&book.key(), &audiobook)
        .await
        .or_raise(|| ErrorKind::Catalog)?;
    if !recorded {
        tracing::warn!("book is not catalogued; audiobook check not recorded");
    }
    tracing::debug!(status = audiobook.status.as_str(), narrators = audiobook.narrators.len(), "audiobook checked");
    Ok(audiobook)
}
