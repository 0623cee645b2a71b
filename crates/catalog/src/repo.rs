//! The book repository.
//!
//! Every book is one row, identified by its [`BookKey`]. Writes never erase
//! stored values with empty ones, and metadata writes never touch the
//! curated columns unless the incoming book carries curated values itself.

use std::collections::HashSet;

use exn::{OptionExt, ResultExt};
use picklelit_extract::models::{Audiobook, Book, BookKey, Curation, CurationPatch, SpiceLevel};
use sqlx::query::QueryScalar;
use sqlx::sqlite::SqliteArguments;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use time::Date;
use tracing::instrument;

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::filter::{BookFilter, Facets, like_pattern};
use crate::models::{BookRow, date_to_column, encode_names};

type ScalarQuery<'q> = QueryScalar<'q, Sqlite, i64, SqliteArguments<'q>>;

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Bind all book columns, in table order, to an insert statement.
fn bind_row(query: ScalarQuery<'_>, row: BookRow) -> ScalarQuery<'_> {
    query
        .bind(row.title_key)
        .bind(row.author_key)
        .bind(row.title)
        .bind(row.authors)
        .bind(row.author_keys)
        .bind(row.isbn_10)
        .bind(row.isbn_13)
        .bind(row.series)
        .bind(row.num_in_series)
        .bind(row.year_published)
        .bind(row.publisher)
        .bind(row.page_count)
        .bind(row.rating)
        .bind(row.description)
        .bind(row.tags)
        .bind(row.spice_level)
        .bind(row.subgenre)
        .bind(row.subgenre_key)
        .bind(row.kindle_unlimited)
        .bind(row.graphic_audio_voices)
        .bind(row.graphic_audio_minutes)
        .bind(row.audiobook)
        .bind(row.audiobook_voices)
        .bind(row.audiobook_minutes)
        .bind(row.audible_link)
        .bind(row.audio_last_updated)
        .bind(row.last_updated)
}

fn into_books(rows: Vec<BookRow>) -> Result<Vec<Book>> {
    rows.into_iter().map(Book::try_from).collect()
}

/// Repository for the `books` table.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    ///
    /// With `dry_run` set, writes are planned against the current state but
    /// nothing is written. Reads behave as usual.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    // =========================================================================
    // Insert
    // =========================================================================

    async fn upsert_with(conn: &mut SqliteConnection, book: &Book) -> Result<UpsertOutcome> {
        let row = BookRow::try_from(book)?;
        let revision = bind_row(sqlx::query_scalar(include_str!("../queries/upsert_book.sql")), row)
            .fetch_one(conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(match revision {
            0 => UpsertOutcome::Inserted,
            _ => UpsertOutcome::Updated,
        })
    }

    /// Insert a book, or update the stored row with the same key.
    ///
    /// Incoming empty values (`None`, empty lists) keep whatever is stored.
    /// The audiobook columns are only written when the book carries an
    /// audiobook check.
    #[instrument(skip_all, fields(key = %book.key()))]
    pub async fn upsert(&self, book: &Book) -> Result<UpsertOutcome> {
        if self.dry_run {
            // Validate the same way a real write would.
            BookRow::try_from(book)?;
            return Ok(match self.contains(&book.key()).await? {
                true => UpsertOutcome::Updated,
                false => UpsertOutcome::Inserted,
            });
        }
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        let outcome = Self::upsert_with(&mut conn, book).await?;
        tracing::debug!(?outcome, "book upserted");
        Ok(outcome)
    }

    /// Upsert a batch of books in a single transaction.
    ///
    /// Returns the number of books written. Any failure rolls the whole batch
    /// back.
    #[instrument(skip_all, fields(count = books.len()))]
    pub async fn upsert_many(&self, books: &[Book]) -> Result<u64> {
        if self.dry_run {
            for book in books {
                BookRow::try_from(book)?;
            }
            return Ok(u64::try_from(books.len()).unwrap_or(0));
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let mut written = 0;
        for book in books {
            Self::upsert_with(&mut tx, book).await?;
            written += 1;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(written)
    }

    /// Insert only the books whose key isn't catalogued yet.
    ///
    /// Existing rows are left untouched. Books sharing a key within the batch
    /// are inserted once (first wins). Returns the books that were inserted.
    #[instrument(skip_all, fields(count = books.len()))]
    pub async fn insert_new(&self, books: &[Book]) -> Result<Vec<Book>> {
        let mut seen = HashSet::new();
        let batch = books.iter().filter(|book| seen.insert(book.key())).collect::<Vec<_>>();
        let mut inserted = Vec::new();
        if self.dry_run {
            for book in batch {
                BookRow::try_from(book)?;
                if !self.contains(&book.key()).await? {
                    inserted.push(book.clone());
                }
            }
            return Ok(inserted);
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for book in batch {
            let row = BookRow::try_from(book)?;
            let id = bind_row(sqlx::query_scalar(include_str!("../queries/insert_new_book.sql")), row)
                .fetch_optional(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            if id.is_some() {
                inserted.push(book.clone());
            }
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(inserted = inserted.len(), "new books inserted");
        Ok(inserted)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn get(&self, key: &BookKey) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(key.title())
            .bind(key.author())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Book::try_from).transpose()
    }

    /// Like [`get`](Self::get), but a missing book is an
    /// [`ErrorKind::NotFound`] error.
    pub async fn require(&self, key: &BookKey) -> Result<Book> {
        self.get(key).await?.ok_or_raise(|| ErrorKind::NotFound(key.to_string()))
    }

    pub async fn contains(&self, key: &BookKey) -> Result<bool> {
        sqlx::query_scalar(include_str!("../queries/book_exists.sql"))
            .bind(key.title())
            .bind(key.author())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Books whose title contains `fragment` (case-insensitive), most recently
    /// updated first.
    pub async fn find_by_title(&self, fragment: impl AsRef<str>) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/find_by_title.sql"))
            .bind(like_pattern(fragment.as_ref()))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_books(rows)
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// A page of the catalog, most recently updated first. Books that were
    /// never fetched come last.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_books(rows)
    }

    /// Books matching every criterion set on `filter`, in [`list`](Self::list) order.
    #[instrument(skip(self))]
    pub async fn search(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM books");
        filter.push_sql(&mut query);
        let rows: Vec<BookRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_books(rows)
    }

    /// Books whose audiobook status was never checked, or was last checked
    /// before `checked_before`. Never-checked books come first.
    pub async fn list_audio_candidates(&self, checked_before: Date, limit: u32) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_audio_candidates.sql"))
            .bind(date_to_column(checked_before))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        into_books(rows)
    }

    /// Distinct filter values currently in use.
    pub async fn facets(&self) -> Result<Facets> {
        let subgenres: Vec<String> = sqlx::query_scalar(include_str!("../queries/list_subgenres.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let spice_levels: Vec<i64> = sqlx::query_scalar(include_str!("../queries/list_spice_levels.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let spice_levels = spice_levels
            .into_iter()
            .map(|s| {
                let half_steps = u8::try_from(s).or_raise(|| ErrorKind::InvalidData("spice_level"))?;
                SpiceLevel::from_half_steps(half_steps).or_raise(|| ErrorKind::InvalidData("spice_level"))
            })
            .collect::<Result<Vec<_>>>()?;
        let span: (Option<i64>, Option<i64>) = sqlx::query_as(include_str!("../queries/year_span.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let years = match span {
            (Some(from), Some(to)) => {
                let from = i32::try_from(from).or_raise(|| ErrorKind::InvalidData("year_published"))?;
                let to = i32::try_from(to).or_raise(|| ErrorKind::InvalidData("year_published"))?;
                Some(from..=to)
            },
            _ => None,
        };
        Ok(Facets { subgenres, spice_levels, years })
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_books.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("count"))
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Record the result of an audiobook check.
    ///
    /// Only the audiobook columns change; `last_updated` tracks metadata
    /// fetches. Returns `false` when no book has this key.
    #[instrument(skip(self, audiobook), fields(status = audiobook.status.as_str()))]
    pub async fn update_audiobook(&self, key: &BookKey, audiobook: &Audiobook) -> Result<bool> {
        if self.dry_run {
            return self.contains(key).await;
        }
        let voices = encode_names(&audiobook.narrators, "audiobook_voices")?;
        let result = sqlx::query(include_str!("../queries/update_audiobook.sql"))
            .bind(audiobook.is_available())
            .bind(voices)
            .bind(audiobook.runtime.map(|r| i64::from(r.minutes())))
            .bind(audiobook.link.as_deref())
            .bind(date_to_column(audiobook.checked_on))
            .bind(key.title())
            .bind(key.author())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Edit individual curated fields. Fields the patch leaves as `None` keep
    /// their stored value. Returns `false` when no book has this key.
    #[instrument(skip(self))]
    pub async fn update_curation(&self, key: &BookKey, patch: &CurationPatch) -> Result<bool> {
        if self.dry_run || patch.is_empty() {
            return self.contains(key).await;
        }
        let voices_patched = patch.graphic_audio_voices.is_some();
        // Applying to an empty curation cleans the patch values the same way
        // an in-memory edit would.
        let mut changes = Curation::default();
        changes.apply(patch.clone());
        let graphic_audio = changes.graphic_audio.unwrap_or_default();
        let subgenre_key = changes.subgenre.as_deref().map(BookKey::normalize);
        let voices = match voices_patched {
            true => Some(encode_names(&graphic_audio.voices, "graphic_audio_voices")?),
            false => None,
        };
        let result = sqlx::query(include_str!("../queries/update_curation.sql"))
            .bind(changes.spice_level.map(|s| i64::from(s.half_steps())))
            .bind(changes.subgenre)
            .bind(subgenre_key)
            .bind(changes.kindle_unlimited)
            .bind(voices)
            .bind(graphic_audio.runtime.map(|r| i64::from(r.minutes())))
            .bind(key.title())
            .bind(key.author())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Returns `true` if a book was deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &BookKey) -> Result<bool> {
        if self.dry_run {
            return self.contains(key).await;
        }
        let result = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(key.title())
            .bind(key.author())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picklelit_extract::models::{Availability, GraphicAudio, Isbn, Runtime, SeriesPosition};
    use time::macros::date;

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    fn spice(half_steps: u8) -> SpiceLevel {
        SpiceLevel::from_half_steps(half_steps).unwrap()
    }

    fn book(title: &str, author: &str) -> Book {
        Book::new(title, [author]).unwrap()
    }

    fn fetched() -> Book {
        let mut book = book("Fourth Wing", "Rebecca Yarros");
        book.isbn_13 = Some(Isbn::parse("9781649374042").unwrap());
        book.series = Some(SeriesPosition::new("The Empyrean", Some("1")));
        book.year_published = Some(2023);
        book.page_count = Some(528);
        book.tags = vec!["Fantasy".to_string(), "Romance".to_string()];
        book.last_updated = Some(date!(2024 - 05 - 01));
        book
    }

    fn available(checked_on: Date) -> Audiobook {
        Audiobook {
            status: Availability::Available,
            narrators: vec!["Rebecca Soler".to_string(), "Teddy Hamilton".to_string()],
            runtime: Some(Runtime::from_minutes(1241)),
            link: Some("https://www.audible.com/pd/B0BTJ5LW6F".to_string()),
            checked_on,
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_is_one_row() {
        let repo = repo().await;
        assert_eq!(repo.upsert(&fetched()).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(repo.upsert(&fetched()).await.unwrap(), UpsertOutcome::Updated);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.get(&fetched().key()).await.unwrap(), Some(fetched()));
    }

    #[tokio::test]
    async fn test_key_is_normalized() {
        let repo = repo().await;
        repo.upsert(&fetched()).await.unwrap();
        repo.upsert(&book("  FOURTH   wing ", "rebecca yarros")).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.require(&BookKey::new("fourth wing", Some("Rebecca Yarros"))).await.unwrap();
        // Title display follows the latest write, but nothing else is erased.
        assert_eq!(stored.title, "FOURTH wing");
        assert_eq!(stored.page_count, Some(528));
        assert_eq!(stored.tags, fetched().tags);
    }

    #[tokio::test]
    async fn test_upsert_keeps_curation() {
        let repo = repo().await;
        let mut curated = fetched();
        curated.curation.spice_level = Some(spice(6));
        curated.curation.subgenre = Some("Romantasy".to_string());
        curated.curation.graphic_audio = Some(GraphicAudio {
            voices: vec!["Full Cast".to_string()],
            runtime: Some(Runtime::from_minutes(900)),
        });
        repo.upsert(&curated).await.unwrap();

        let mut refetched = fetched();
        refetched.page_count = Some(530);
        refetched.last_updated = Some(date!(2024 - 06 - 01));
        repo.upsert(&refetched).await.unwrap();

        let stored = repo.require(&fetched().key()).await.unwrap();
        assert_eq!(stored.curation, curated.curation);
        assert_eq!(stored.page_count, Some(530));
        assert_eq!(stored.last_updated, Some(date!(2024 - 06 - 01)));
    }

    #[tokio::test]
    async fn test_upsert_keeps_audio_without_check() {
        let repo = repo().await;
        let mut checked = fetched();
        checked.audiobook = Some(available(date!(2024 - 05 - 02)));
        repo.upsert(&checked).await.unwrap();
        repo.upsert(&fetched()).await.unwrap();
        let stored = repo.require(&fetched().key()).await.unwrap();
        assert_eq!(stored.audiobook, checked.audiobook);
    }

    #[tokio::test]
    async fn test_upsert_many() {
        let repo = repo().await;
        let books = vec![fetched(), book("Powerless", "Lauren Roberts"), fetched()];
        assert_eq!(repo.upsert_many(&books).await.unwrap(), 3);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_rejects_blank_title() {
        let repo = repo().await;
        let mut book = fetched();
        book.title = " ".to_string();
        let err = repo.upsert(&book).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("title")));
    }

    #[tokio::test]
    async fn test_insert_new_skips_existing() {
        let repo = repo().await;
        let mut stored = fetched();
        stored.curation.subgenre = Some("Romantasy".to_string());
        repo.upsert(&stored).await.unwrap();

        let mut candidate = fetched();
        candidate.page_count = Some(1);
        let fresh = book("Powerless", "Lauren Roberts");
        let inserted = repo
            .insert_new(&[candidate, fresh.clone(), fresh.clone()])
            .await
            .unwrap();
        assert_eq!(inserted, vec![fresh]);
        assert_eq!(repo.count().await.unwrap(), 2);
        // Untouched.
        assert_eq!(repo.require(&stored.key()).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_require_missing() {
        let repo = repo().await;
        let err = repo.require(&BookKey::new("Nope", None::<&str>)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_title() {
        let repo = repo().await;
        let mut older = book("Love, Theoretically", "Ali Hazelwood");
        older.last_updated = Some(date!(2024 - 01 - 01));
        let mut newer = book("The Love Hypothesis", "Ali Hazelwood");
        newer.last_updated = Some(date!(2024 - 02 - 01));
        repo.upsert_many(&[older.clone(), newer.clone(), fetched()]).await.unwrap();

        let found = repo.find_by_title("LOVE").await.unwrap();
        assert_eq!(found, vec![newer, older]);
        assert!(repo.find_by_title("100%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let repo = repo().await;
        let never = book("Never Fetched", "Someone");
        let mut a = book("A", "Someone");
        a.last_updated = Some(date!(2024 - 01 - 01));
        let mut b = book("B", "Someone");
        b.last_updated = Some(date!(2024 - 03 - 01));
        repo.upsert_many(&[never.clone(), a.clone(), b.clone()]).await.unwrap();
        assert_eq!(repo.list(2, 0).await.unwrap(), vec![b, a]);
        assert_eq!(repo.list(2, 2).await.unwrap(), vec![never]);
    }

    #[tokio::test]
    async fn test_search() {
        let repo = repo().await;
        let mut wing = fetched();
        wing.curation.spice_level = Some(spice(6));
        wing.curation.subgenre = Some("Romantasy".to_string());
        wing.audiobook = Some(available(date!(2024 - 05 - 02)));
        let mut hypothesis = book("The Love Hypothesis", "Ali Hazelwood");
        hypothesis.year_published = Some(2021);
        hypothesis.curation.spice_level = Some(spice(8));
        hypothesis.curation.subgenre = Some("Contemporary".to_string());
        let undated = book("Undated", "Nobody");
        repo.upsert_many(&[wing.clone(), hypothesis.clone(), undated.clone()]).await.unwrap();

        let all = repo.search(&BookFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let by_author = BookFilter { author: Some("hazel".to_string()), ..Default::default() };
        assert_eq!(repo.search(&by_author).await.unwrap(), vec![hypothesis.clone()]);

        let by_years = BookFilter { years: Some(2022..=2023), ..Default::default() };
        assert_eq!(repo.search(&by_years).await.unwrap(), vec![wing.clone()]);

        let by_spice = BookFilter { spice: Some(spice(7)..=spice(10)), ..Default::default() };
        assert_eq!(repo.search(&by_spice).await.unwrap(), vec![hypothesis.clone()]);

        let by_subgenre = BookFilter {
            subgenres: vec!["romantasy".to_string(), "Dark".to_string()],
            ..Default::default()
        };
        assert_eq!(repo.search(&by_subgenre).await.unwrap(), vec![wing.clone()]);

        let audio = BookFilter { audiobook_only: true, ..Default::default() };
        assert_eq!(repo.search(&audio).await.unwrap(), vec![wing.clone()]);

        let nothing = BookFilter {
            title: Some("wing".to_string()),
            author: Some("hazelwood".to_string()),
            ..Default::default()
        };
        assert!(repo.search(&nothing).await.unwrap().is_empty());

        let limited = BookFilter { limit: Some(1), ..Default::default() };
        assert_eq!(repo.search(&limited).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii() {
        let repo = repo().await;
        let mut baiser = book("Le Baiser", "Émilie Richards");
        baiser.curation.subgenre = Some("Érotique".to_string());
        repo.upsert(&baiser).await.unwrap();

        for author in ["Émilie Richards", "émilie", "ÉMILIE RICH"] {
            let filter = BookFilter { author: Some(author.to_string()), ..Default::default() };
            assert_eq!(repo.search(&filter).await.unwrap(), vec![baiser.clone()], "author {author}");
        }
        for subgenre in ["Érotique", "érotique", " ÉROTIQUE "] {
            let filter = BookFilter { subgenres: vec![subgenre.to_string()], ..Default::default() };
            assert_eq!(repo.search(&filter).await.unwrap(), vec![baiser.clone()], "subgenre {subgenre}");
        }

        // An edited subgenre is matched by its new folded value.
        let patch = CurationPatch { subgenre: Some("Ångst".to_string()), ..Default::default() };
        assert!(repo.update_curation(&baiser.key(), &patch).await.unwrap());
        let filter = BookFilter { subgenres: vec!["ångst".to_string()], ..Default::default() };
        assert_eq!(repo.search(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_audiobook() {
        let repo = repo().await;
        repo.upsert(&fetched()).await.unwrap();
        let audiobook = available(date!(2024 - 07 - 01));
        assert!(repo.update_audiobook(&fetched().key(), &audiobook).await.unwrap());
        let stored = repo.require(&fetched().key()).await.unwrap();
        assert_eq!(stored.audiobook, Some(audiobook.clone()));
        // Metadata freshness is separate from the audio check.
        assert_eq!(stored.last_updated, fetched().last_updated);

        let gone = Audiobook::unavailable(date!(2024 - 08 - 01));
        assert!(repo.update_audiobook(&fetched().key(), &gone).await.unwrap());
        assert_eq!(repo.require(&fetched().key()).await.unwrap().audiobook, Some(gone));

        let missing = BookKey::new("Missing", Some("Nobody"));
        assert!(!repo.update_audiobook(&missing, &audiobook).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_curation() {
        let repo = repo().await;
        repo.upsert(&fetched()).await.unwrap();
        let key = fetched().key();

        let patch = CurationPatch {
            spice_level: Some(spice(5)),
            subgenre: Some("  Romantasy ".to_string()),
            ..Default::default()
        };
        assert!(repo.update_curation(&key, &patch).await.unwrap());
        let patch = CurationPatch {
            kindle_unlimited: Some(true),
            graphic_audio_runtime: Some(Runtime::from_minutes(600)),
            ..Default::default()
        };
        assert!(repo.update_curation(&key, &patch).await.unwrap());

        let curation = repo.require(&key).await.unwrap().curation;
        assert_eq!(curation.spice_level, Some(spice(5)));
        assert_eq!(curation.subgenre.as_deref(), Some("Romantasy"));
        assert_eq!(curation.kindle_unlimited, Some(true));
        assert_eq!(
            curation.graphic_audio,
            Some(GraphicAudio { voices: vec![], runtime: Some(Runtime::from_minutes(600)) })
        );

        let patch = CurationPatch {
            graphic_audio_voices: Some(vec!["Full Cast".to_string(), "full cast".to_string()]),
            ..Default::default()
        };
        assert!(repo.update_curation(&key, &patch).await.unwrap());
        let graphic_audio = repo.require(&key).await.unwrap().curation.graphic_audio.unwrap();
        assert_eq!(graphic_audio.voices, vec!["Full Cast".to_string()]);
        assert_eq!(graphic_audio.runtime, Some(Runtime::from_minutes(600)));

        let missing = BookKey::new("Missing", Some("Nobody"));
        assert!(!repo.update_curation(&missing, &patch).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_audio_candidates() {
        let repo = repo().await;
        let never = book("Never Checked", "Someone");
        let mut old = book("Old Check", "Someone");
        old.audiobook = Some(Audiobook::unavailable(date!(2024 - 01 - 01)));
        let mut recent = book("Recent Check", "Someone");
        recent.audiobook = Some(available(date!(2024 - 06 - 01)));
        repo.upsert_many(&[old.clone(), recent, never.clone()]).await.unwrap();

        let candidates = repo.list_audio_candidates(date!(2024 - 03 - 01), 10).await.unwrap();
        assert_eq!(candidates, vec![never.clone(), old]);
        let candidates = repo.list_audio_candidates(date!(2024 - 03 - 01), 1).await.unwrap();
        assert_eq!(candidates, vec![never]);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        repo.upsert(&fetched()).await.unwrap();
        assert!(repo.delete(&fetched().key()).await.unwrap());
        assert!(!repo.delete(&fetched().key()).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_facets() {
        let repo = repo().await;
        assert_eq!(repo.facets().await.unwrap(), Facets::default());

        let mut a = fetched();
        a.curation.spice_level = Some(spice(6));
        a.curation.subgenre = Some("Romantasy".to_string());
        let mut b = book("The Love Hypothesis", "Ali Hazelwood");
        b.year_published = Some(2021);
        b.curation.spice_level = Some(spice(6));
        b.curation.subgenre = Some("contemporary".to_string());
        repo.upsert_many(&[a, b]).await.unwrap();

        let facets = repo.facets().await.unwrap();
        assert_eq!(facets.subgenres, vec!["contemporary".to_string(), "Romantasy".to_string()]);
        assert_eq!(facets.spice_levels, vec![spice(6)]);
        assert_eq!(facets.years, Some(2021..=2023));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::new(db.pool().clone(), true);
        assert_eq!(repo.upsert(&fetched()).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(repo.insert_new(&[fetched()]).await.unwrap(), vec![fetched()]);
        assert!(!repo.delete(&fetched().key()).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);

        Repository::from(&db).upsert(&fetched()).await.unwrap();
        assert_eq!(repo.upsert(&fetched()).await.unwrap(), UpsertOutcome::Updated);
        assert!(repo.insert_new(&[fetched()]).await.unwrap().is_empty());
        assert!(repo.delete(&fetched().key()).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
