use std::collections::VecDeque;

use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use picklelit_extract::Book;
use picklelit_extract::models::{Audiobook, BookKey};

use crate::audio::check_audiobook;
use crate::error::{ErrorKind, Result};
use crate::staleness::today;
use crate::{Context, MAX_CONCURRENCY, Staleness};

/// Progress events emitted by [`refresh_audiobooks`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of books given.
/// 3. [`Skipped`](Self::Skipped) for every book with a fresh check, then
///    [`Checked`](Self::Checked) (or an `Err`) for every other book, in
///    completion order.
/// 4. [`Complete`](Self::Complete) exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioEvent {
    Started,
    DiscoveryComplete(u64),
    /// The book was checked and the result recorded.
    Checked { key: BookKey, audiobook: Audiobook },
    /// The book's last check is still fresh.
    Skipped { key: BookKey },
    Complete,
}

/// Streams an audiobook check for every book in `books` whose last check is
/// stale according to `staleness`.
///
/// Checks run concurrently, up to [`MAX_CONCURRENCY`] at a time. With a
/// request delay configured they run one at a time instead, the delay
/// separating consecutive requests. A failed check is yielded as an `Err`
/// (of kind [`ErrorKind::Audiobook`]) and the stream carries on.
pub fn refresh_audiobooks<'a>(
    ctx: &'a Context,
    books: Vec<Book>,
    staleness: Staleness,
) -> impl Stream<Item = Result<AudioEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(AudioEvent::Started);
        yield Ok(AudioEvent::DiscoveryComplete(u64::try_from(books.len()).unwrap_or(0)));

        let today = today();
        let (stale, fresh): (Vec<_>, Vec<_>) = books
            .into_iter()
            .partition(|book| staleness.is_stale(book.audiobook.as_ref().map(|a| a.checked_on), today));
        for book in fresh {
            yield Ok(AudioEvent::Skipped { key: book.key() });
        }

        let concurrency = match ctx.request_delay.is_zero() {
            true => MAX_CONCURRENCY,
            false => 1,
        };
        let mut queue: VecDeque<_> = stale
            .into_iter()
            .enumerate()
            .map(|(index, book)| check(ctx, book, index > 0))
            .collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(queue.drain(..concurrency.min(queue.len())));
        while let Some(result) = processing.next().await {
            yield result;
            if let Some(next) = queue.pop_front() {
                processing.push(next);
            }
        }

        yield Ok(AudioEvent::Complete);
    })
}

async fn check(ctx: &Context, book: Book, delayed: bool) -> Result<AudioEvent> {
    if delayed && !ctx.request_delay.is_zero() {
        tokio::time::sleep(ctx.request_delay).await;
    }
    let key = book.key();
    let audiobook = check_audiobook(ctx, &book)
        .await
        .or_raise(|| ErrorKind::Audiobook(key.clone()))?;
    Ok(AudioEvent::Checked { key, audiobook })
}
