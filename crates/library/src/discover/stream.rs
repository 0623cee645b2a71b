use std::ops::RangeInclusive;

use async_stream::stream;
use derive_more::Display;
use exn::ResultExt;
use futures::Stream;
use picklelit_extract::models::BookKey;
use picklelit_extract::{Book, SubjectWork};

use crate::error::{ErrorKind, Result};
use crate::staleness::today;
use crate::{Context, Throttle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverOptions {
    pub subject: String,
    pub pages: u32,
    pub page_size: u32,
    /// Editions fetched per work to build its summary
    pub editions_limit: u32,
    /// Works first published outside this range are skipped
    pub years: RangeInclusive<i32>,
    pub with_audiobook: bool,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            subject: "romance".to_string(),
            pages: 2,
            page_size: 50,
            editions_limit: 10,
            years: 2005..=2025,
            with_audiobook: false,
        }
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    #[display("no first publish year")]
    NoYear,
    #[display("first published in {_0}")]
    OutOfRange(i32),
}

/// Progress events emitted by [`discover`].
///
/// [`Started`](Self::Started) comes first. Each page produces a
/// [`PageFetched`](Self::PageFetched) followed by one event (or `Err`) per
/// work on it. [`Complete`](Self::Complete) comes last, unless a page could
/// not be fetched: that error ends the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoverEvent {
    Started,
    /// `page` counts from zero; `works` is the number of works on it.
    PageFetched { page: u32, works: usize },
    Skipped { title: String, reason: SkipReason },
    Added(Box<Book>),
    AlreadyCatalogued(BookKey),
    Complete { added: u64 },
}

/// Streams [`DiscoverEvent`]s while paging through `options.subject`.
///
/// Each new work in the year range has its editions summarized, is
/// optionally checked against the audiobook source, and is inserted into the
/// catalog. Consecutive requests are separated by the context's request
/// delay.
pub fn discover<'a>(ctx: &'a Context, options: DiscoverOptions) -> impl Stream<Item = Result<DiscoverEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(DiscoverEvent::Started);
        if options.page_size == 0 {
            yield Err(exn::Exn::from(ErrorKind::InvalidInput("page_size")));
            return;
        }
        if options.subject.trim().is_empty() {
            yield Err(exn::Exn::from(ErrorKind::InvalidInput("subject")));
            return;
        }

        let mut throttle = ctx.throttle();
        let mut added = 0;
        for page in 0..options.pages {
            throttle.wait().await;
            let listing = match ctx
                .subjects
                .list_subject(&options.subject, page.saturating_mul(options.page_size), options.page_size)
                .await
            {
                Ok(listing) => listing,
                Err(err) => {
                    yield Err(ErrorKind::source(err));
                    return;
                },
            };
            tracing::debug!(page, works = listing.works.len(), total = listing.work_count, "subject page fetched");
            yield Ok(DiscoverEvent::PageFetched { page, works: listing.works.len() });
            let last_page = listing.works.len() < options.page_size as usize;

            for work in listing.works {
                let title = work.title.clone();
                match work.first_publish_year {
                    None => {
                        yield Ok(DiscoverEvent::Skipped { title, reason: SkipReason::NoYear });
                        continue;
                    },
                    Some(year) if !options.years.contains(&year) => {
                        yield Ok(DiscoverEvent::Skipped { title, reason: SkipReason::OutOfRange(year) });
                        continue;
                    },
                    Some(_) => {},
                }
                let key = BookKey::new(&work.title, work.author.as_deref());
                match ctx.catalog.contains(&key).await {
                    Ok(true) => {
                        yield Ok(DiscoverEvent::AlreadyCatalogued(key));
                        continue;
                    },
                    Ok(false) => {},
                    Err(err) => {
                        yield Err(err).or_raise(|| ErrorKind::Catalog);
                        continue;
                    },
                }

                let mut book = match catalog_entry(ctx, &mut throttle, work, &options).await {
                    Ok(book) => book,
                    Err(err) => {
                        yield Err(err).or_raise(|| ErrorKind::Discover(title));
                        continue;
                    },
                };
                if options.with_audiobook {
                    throttle.wait().await;
                    match ctx.audiobooks.lookup(&book.title, book.primary_author()).await {
                        Ok(audiobook) => book.audiobook = Some(audiobook),
                        // Still worth cataloguing; the next audio refresh retries.
                        Err(err) => {
                            yield Err(ErrorKind::source(err)).or_raise(|| ErrorKind::Audiobook(key.clone()));
                        },
                    }
                }

                match ctx.catalog.insert_new(std::slice::from_ref(&book)).await {
                    Ok(inserted) if inserted.is_empty() => {
                        yield Ok(DiscoverEvent::AlreadyCatalogued(key));
                    },
                    Ok(_) => {
                        added += 1;
                        yield Ok(DiscoverEvent::Added(Box::new(book)));
                    },
                    Err(err) => {
                        yield Err(err).or_raise(|| ErrorKind::Catalog);
                    },
                }
            }

            if last_page {
                break;
            }
        }

        yield Ok(DiscoverEvent::Complete { added });
    })
}

async fn catalog_entry(
    ctx: &Context,
    throttle: &mut Throttle,
    work: SubjectWork,
    options: &DiscoverOptions,
) -> Result<Book> {
    throttle.wait().await;
    let editions = ctx
        .subjects
        .editions(&work.key, options.editions_limit)
        .await
        .map_err(ErrorKind::source)?;
    let book = work
        .into_book(editions, &options.subject)
        .or_raise(|| ErrorKind::InvalidInput("work"))?;
    Ok(book.with_last_updated(today()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use picklelit_extract::EditionSummary;
    use picklelit_extract::models::{Audiobook, Availability, Isbn};
    use picklelit_source::MockSource;

    use crate::testing::context;

    fn work(n: u32, year: Option<i32>) -> SubjectWork {
        SubjectWork {
            key: format!("/works/OL{n}W"),
            title: format!("Work {n}"),
            author: Some("Author".to_string()),
            first_publish_year: year,
            subjects: vec!["Love stories".to_string()],
        }
    }

    fn options() -> DiscoverOptions {
        DiscoverOptions {
            subject: "romance".to_string(),
            pages: 5,
            page_size: 2,
            editions_limit: 10,
            years: 2010..=2020,
            with_audiobook: false,
        }
    }

    async fn run(ctx: &Context, options: DiscoverOptions) -> Vec<Result<DiscoverEvent>> {
        discover(ctx, options).collect().await
    }

    fn unwrap_all(results: Vec<Result<DiscoverEvent>>) -> Vec<DiscoverEvent> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[tokio::test]
    async fn test_discover_adds_new_works() {
        let works = [work(1, Some(2015)), work(2, Some(1999)), work(3, None)];
        let summary = EditionSummary {
            isbns: vec![Isbn::parse("0316015849").unwrap()],
            page_count: Some(300),
            publishers: vec!["Pub".to_string()],
            series: None,
        };
        let source = MockSource::default()
            .with_subject("romance", works)
            .with_editions("/works/OL1W", summary);
        let (ctx, _source, _db) = context(source).await;

        let events = unwrap_all(run(&ctx, options()).await);
        assert_eq!(events[0], DiscoverEvent::Started);
        assert_eq!(events[1], DiscoverEvent::PageFetched { page: 0, works: 2 });
        let DiscoverEvent::Added(book) = &events[2] else { panic!("expected Added") };
        assert_eq!(book.title, "Work 1");
        assert_eq!(book.page_count, Some(300));
        assert_eq!(book.isbn_13.as_ref().map(|i| i.to_string()).as_deref(), Some("9780316015844"));
        assert_eq!(book.curation.subgenre.as_deref(), Some("romance"));
        assert_eq!(
            events[3],
            DiscoverEvent::Skipped { title: "Work 2".to_string(), reason: SkipReason::OutOfRange(1999) }
        );
        assert_eq!(events[4], DiscoverEvent::PageFetched { page: 1, works: 1 });
        assert_eq!(events[5], DiscoverEvent::Skipped { title: "Work 3".to_string(), reason: SkipReason::NoYear });
        // The short page was the last one.
        assert_eq!(events[6], DiscoverEvent::Complete { added: 1 });
        assert_eq!(events.len(), 7);

        let stored = ctx.catalog.require(&book.key()).await.unwrap();
        assert_eq!(stored, **book);
    }

    #[tokio::test]
    async fn test_discover_never_reinserts() {
        let source = MockSource::default().with_subject("romance", [work(1, Some(2015)), work(2, Some(2016))]);
        let (ctx, source, _db) = context(source).await;
        let mut existing = Book::new("Work 1", ["Author"]).unwrap();
        existing.curation.subgenre = Some("Sports".to_string());
        ctx.catalog.upsert(&existing).await.unwrap();

        let events = unwrap_all(run(&ctx, options()).await);
        assert!(events.contains(&DiscoverEvent::AlreadyCatalogued(existing.key())));
        assert_eq!(events.last(), Some(&DiscoverEvent::Complete { added: 1 }));
        assert_eq!(ctx.catalog.require(&existing.key()).await.unwrap(), existing);
        // One listing for the full page, one for the empty page after it,
        // and editions for the new work only.
        assert_eq!(source.subject_calls(), 3);

        let events = unwrap_all(run(&ctx, options()).await);
        assert_eq!(events.last(), Some(&DiscoverEvent::Complete { added: 0 }));
        assert_eq!(ctx.catalog.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_discover_continues_after_work_failure() {
        let source = MockSource::default()
            .with_subject("romance", [work(1, Some(2015)), work(2, Some(2015))])
            .failing_title("/works/OL1W");
        let (ctx, _source, _db) = context(source).await;

        let results = run(&ctx, options()).await;
        let errors = results.iter().filter_map(|r| r.as_ref().err()).map(|e| (**e).clone()).collect::<Vec<_>>();
        assert_eq!(errors, vec![ErrorKind::Discover("Work 1".to_string())]);
        let events = results.into_iter().filter_map(|r| r.ok()).collect::<Vec<_>>();
        assert_eq!(events.last(), Some(&DiscoverEvent::Complete { added: 1 }));
    }

    #[tokio::test]
    async fn test_discover_page_failure_ends_stream() {
        let (ctx, _source, _db) = context(MockSource::default().failing_title("romance")).await;
        let results = run(&ctx, options()).await;
        assert_eq!(results.len(), 2);
        let err = results[1].as_ref().unwrap_err();
        assert!(matches!(&**err, ErrorKind::Source(_)));
    }

    #[tokio::test]
    async fn test_discover_with_audiobook() {
        let audiobook = Audiobook {
            status: Availability::Available,
            narrators: vec!["Narrator".to_string()],
            runtime: None,
            link: None,
            checked_on: today(),
        };
        let source = MockSource::default()
            .with_subject("romance", [work(1, Some(2015))])
            .with_audiobook("Work 1", audiobook.clone());
        let (ctx, source, _db) = context(source).await;
        let options = DiscoverOptions { with_audiobook: true, ..options() };

        let events = unwrap_all(run(&ctx, options).await);
        assert_eq!(events.last(), Some(&DiscoverEvent::Complete { added: 1 }));
        assert_eq!(source.audio_calls(), 1);
        let stored = ctx.catalog.require(&BookKey::new("Work 1", Some("Author"))).await.unwrap();
        assert_eq!(stored.audiobook, Some(audiobook));
    }

    #[tokio::test]
    async fn test_discover_rejects_zero_page_size() {
        let (ctx, source, _db) = context(MockSource::default()).await;
        let results = run(&ctx, DiscoverOptions { page_size: 0, ..options() }).await;
        assert!(matches!(&**results[1].as_ref().unwrap_err(), ErrorKind::InvalidInput("page_size")));
        assert_eq!(source.subject_calls(), 0);
    }
}
