use exn::ResultExt;
use picklelit_extract::models::{
    Audiobook, Availability, Book, BookKey, Curation, GraphicAudio, Isbn, Runtime, SeriesPosition, SpiceLevel,
};
use time::{Date, UtcDateTime};

use crate::error::{Error, ErrorKind, Result};
use crate::models::facet::{decode_names, encode_names};

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) title_key: String,
    pub(crate) author_key: String,
    pub(crate) title: String,
    pub(crate) authors: String,
    /// `authors`, each folded like [`BookKey`] parts
    pub(crate) author_keys: String,
    pub(crate) isbn_10: Option<String>,
    pub(crate) isbn_13: Option<String>,
    pub(crate) series: Option<String>,
    pub(crate) num_in_series: Option<String>,
    pub(crate) year_published: Option<i64>,
    pub(crate) publisher: Option<String>,
    pub(crate) page_count: Option<i64>,
    pub(crate) rating: Option<f64>,
    pub(crate) description: Option<String>,
    pub(crate) tags: String,
    pub(crate) spice_level: Option<i64>,
    pub(crate) subgenre: Option<String>,
    pub(crate) subgenre_key: Option<String>,
    pub(crate) kindle_unlimited: Option<bool>,
    pub(crate) graphic_audio_voices: Option<String>,
    pub(crate) graphic_audio_minutes: Option<i64>,
    pub(crate) audiobook: Option<bool>,
    pub(crate) audiobook_voices: String,
    pub(crate) audiobook_minutes: Option<i64>,
    pub(crate) audible_link: Option<String>,
    pub(crate) audio_last_updated: Option<i64>,
    pub(crate) last_updated: Option<i64>,
}

pub(crate) fn date_to_column(date: Date) -> i64 {
    date.midnight().as_utc().unix_timestamp()
}

fn date_from_column(timestamp: i64, column: &'static str) -> Result<Date> {
    Ok(UtcDateTime::from_unix_timestamp(timestamp)
        .or_raise(|| ErrorKind::InvalidData(column))?
        .date())
}

fn folded(names: &[String]) -> Vec<String> {
    names.iter().map(|name| BookKey::normalize(name)).collect()
}

fn u32_from_column(value: i64, column: &'static str) -> Result<u32> {
    u32::try_from(value).or_raise(|| ErrorKind::InvalidData(column))
}

impl TryFrom<&Book> for BookRow {
    type Error = Error;
    fn try_from(book: &Book) -> Result<Self> {
        if book.title.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidData("title"));
        }
        let key = book.key();
        let curation = &book.curation;
        let audiobook = book.audiobook.as_ref();
        Ok(Self {
            title_key: key.title().to_string(),
            author_key: key.author().to_string(),
            title: book.title.clone(),
            authors: encode_names(&book.authors, "authors")?,
            author_keys: encode_names(&folded(&book.authors), "author_keys")?,
            isbn_10: book.isbn_10.as_ref().map(|i| i.to_string()),
            isbn_13: book.isbn_13.as_ref().map(|i| i.to_string()),
            series: book.series.as_ref().map(|s| s.name.clone()),
            num_in_series: book.series.as_ref().and_then(|s| s.position.clone()),
            year_published: book.year_published.map(i64::from),
            publisher: book.publisher.clone(),
            page_count: book.page_count.map(i64::from),
            rating: book.rating.map(f64::from),
            description: book.description.clone(),
            tags: encode_names(&book.tags, "tags")?,
            spice_level: curation.spice_level.map(|s| i64::from(s.half_steps())),
            subgenre: curation.subgenre.clone(),
            subgenre_key: curation.subgenre.as_deref().map(BookKey::normalize),
            kindle_unlimited: curation.kindle_unlimited,
            graphic_audio_voices: curation
                .graphic_audio
                .as_ref()
                .map(|g| encode_names(&g.voices, "graphic_audio_voices"))
                .transpose()?,
            graphic_audio_minutes: curation
                .graphic_audio
                .as_ref()
                .and_then(|g| g.runtime)
                .map(|r| i64::from(r.minutes())),
            audiobook: audiobook.map(Audiobook::is_available),
            audiobook_voices: encode_names(
                audiobook.map(|a| a.narrators.as_slice()).unwrap_or_default(),
                "audiobook_voices",
            )?,
            audiobook_minutes: audiobook.and_then(|a| a.runtime).map(|r| i64::from(r.minutes())),
            audible_link: audiobook.and_then(|a| a.link.clone()),
            audio_last_updated: audiobook.map(|a| date_to_column(a.checked_on)),
            last_updated: book.last_updated.map(date_to_column),
        })
    }
}

impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self> {
        let graphic_audio = match (&row.graphic_audio_voices, row.graphic_audio_minutes) {
            (None, None) => None,
            (voices, minutes) => Some(GraphicAudio {
                voices: voices
                    .as_deref()
                    .map(|v| decode_names(v, "graphic_audio_voices"))
                    .transpose()?
                    .unwrap_or_default(),
                runtime: minutes
                    .map(|m| u32_from_column(m, "graphic_audio_minutes"))
                    .transpose()?
                    .map(Runtime::from_minutes),
            }),
        };
        let audiobook = match (row.audiobook, row.audio_last_updated) {
            (Some(available), Some(checked_on)) => Some(Audiobook {
                status: match available {
                    true => Availability::Available,
                    false => Availability::Unavailable,
                },
                narrators: decode_names(&row.audiobook_voices, "audiobook_voices")?,
                runtime: row
                    .audiobook_minutes
                    .map(|m| u32_from_column(m, "audiobook_minutes"))
                    .transpose()?
                    .map(Runtime::from_minutes),
                link: row.audible_link,
                checked_on: date_from_column(checked_on, "audio_last_updated")?,
            }),
            _ => None,
        };
        Ok(Self {
            title: row.title,
            authors: decode_names(&row.authors, "authors")?,
            isbn_10: row
                .isbn_10
                .map(|i| Isbn::parse(&i).or_raise(|| ErrorKind::InvalidData("isbn_10")))
                .transpose()?,
            isbn_13: row
                .isbn_13
                .map(|i| Isbn::parse(&i).or_raise(|| ErrorKind::InvalidData("isbn_13")))
                .transpose()?,
            series: row.series.map(|name| SeriesPosition::new(name, row.num_in_series)),
            year_published: row
                .year_published
                .map(|y| i32::try_from(y).or_raise(|| ErrorKind::InvalidData("year_published")))
                .transpose()?,
            publisher: row.publisher,
            page_count: row.page_count.map(|p| u32_from_column(p, "page_count")).transpose()?,
            rating: row.rating.map(|r| r as f32),
            description: row.description,
            tags: decode_names(&row.tags, "tags")?,
            curation: Curation {
                spice_level: row
                    .spice_level
                    .map(|s| {
                        let half_steps = u8::try_from(s).or_raise(|| ErrorKind::InvalidData("spice_level"))?;
                        SpiceLevel::from_half_steps(half_steps).or_raise(|| ErrorKind::InvalidData("spice_level"))
                    })
                    .transpose()?,
                subgenre: row.subgenre,
                kindle_unlimited: row.kindle_unlimited,
                graphic_audio,
            },
            audiobook,
            last_updated: row.last_updated.map(|d| date_from_column(d, "last_updated")).transpose()?,
        })
    }
}
