//! Terminal rendering of catalog records.

use std::fmt::Write as _;
use std::io::Write;

use exn::ResultExt;
use picklelit_catalog::Facets;
use picklelit_extract::Book;
use picklelit_library::audio::AudioEvent;
use picklelit_library::discover::DiscoverEvent;
use serde::Serialize;

use crate::error::{ErrorKind, Result};

/// One line per book, for listings.
pub fn book_line(book: &Book) -> String {
    let mut line = book.title.clone();
    if let Some(series) = &book.series {
        match &series.position {
            Some(position) => _ = write!(line, " ({} #{position})", series.name),
            None => _ = write!(line, " ({})", series.name),
        }
    }
    if !book.authors.is_empty() {
        _ = write!(line, " by {}", book.author_display());
    }
    if let Some(year) = book.year_published {
        _ = write!(line, ", {year}");
    }
    if let Some(spice) = book.curation.spice_level {
        _ = write!(line, " [spice {spice}]");
    }
    if book.audiobook.as_ref().is_some_and(|a| a.is_available()) {
        line.push_str(" [audiobook]");
    }
    line
}

/// Every field of a book, for `show`.
pub fn book_detail(book: &Book) -> String {
    let mut out = String::new();
    let mut field = |name: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            _ = writeln!(out, "{name:>18}: {value}");
        }
    };
    field("Title", Some(book.title.clone()));
    field("Authors", Some(book.author_display()));
    field(
        "Series",
        book.series.as_ref().map(|s| match &s.position {
            Some(position) => format!("{} #{position}", s.name),
            None => s.name.clone(),
        }),
    );
    field("ISBN-13", book.isbn_13.as_ref().map(ToString::to_string));
    field("ISBN-10", book.isbn_10.as_ref().map(ToString::to_string));
    field("Published", book.year_published.map(|y| y.to_string()));
    field("Publisher", book.publisher.clone());
    field("Pages", book.page_count.map(|p| p.to_string()));
    field("Rating", book.rating.map(|r| format!("{r:.2}")));
    field("Tags", Some(book.tags.join(", ")));
    let curation = &book.curation;
    field("Spice", curation.spice_level.map(|s| s.to_string()));
    field("Subgenre", curation.subgenre.clone());
    field("Kindle Unlimited", curation.kindle_unlimited.map(|ku| if ku { "yes" } else { "no" }.to_string()));
    if let Some(graphic) = &curation.graphic_audio {
        field("Graphic audio", Some(graphic.voices.join(", ")));
        field("Graphic audio time", graphic.runtime.map(|r| r.to_string()));
    }
    match &book.audiobook {
        None => field("Audiobook", Some("never checked".to_string())),
        Some(audiobook) => {
            field("Audiobook", Some(format!("{} (checked {})", audiobook.status, audiobook.checked_on)));
            field("Narrators", Some(audiobook.narrators.join(", ")));
            field("Listening time", audiobook.runtime.map(|r| r.to_string()));
            field("Audible", audiobook.link.clone());
        },
    }
    field("Last updated", Some(book.last_updated.map_or_else(|| "never".to_string(), |d| d.to_string())));
    if let Some(description) = &book.description {
        _ = write!(out, "\n{description}\n");
    }
    out
}

/// Progress line for an audiobook refresh, if the event warrants one.
pub fn audio_line(event: &AudioEvent) -> Option<String> {
    match event {
        AudioEvent::Started | AudioEvent::Complete => None,
        AudioEvent::DiscoveryComplete(count) => Some(format!("{count} books to consider")),
        AudioEvent::Checked { key, audiobook } if audiobook.is_available() => {
            let mut line = format!("{key}: available");
            if !audiobook.narrators.is_empty() {
                _ = write!(line, ", narrated by {}", audiobook.narrators.join(", "));
            }
            if let Some(runtime) = audiobook.runtime {
                _ = write!(line, " ({runtime})");
            }
            Some(line)
        },
        AudioEvent::Checked { key, .. } => Some(format!("{key}: no audiobook")),
        AudioEvent::Skipped { key } => Some(format!("{key}: checked recently, skipped")),
    }
}

/// Progress line for a discovery run, if the event warrants one.
pub fn discover_line(event: &DiscoverEvent) -> Option<String> {
    match event {
        DiscoverEvent::Started | DiscoverEvent::PageFetched { .. } => None,
        DiscoverEvent::Skipped { title, reason } => Some(format!("skipped {title}: {reason}")),
        DiscoverEvent::Added(book) => Some(format!("added {}", book_line(book))),
        DiscoverEvent::AlreadyCatalogued(key) => Some(format!("already catalogued {key}")),
        DiscoverEvent::Complete { added } => Some(format!("{added} books added")),
    }
}

pub fn print_facets(facets: &Facets, json: bool) -> Result<()> {
    let years = facets.years.as_ref().map(|years| (*years.start(), *years.end()));
    if json {
        return print_json(&serde_json::json!({
            "subgenres": facets.subgenres,
            "spice_levels": facets.spice_levels,
            "years": years.map(|(from, to)| serde_json::json!({ "from": from, "to": to })),
        }));
    }
    let spice = facets.spice_levels.iter().map(ToString::to_string).collect::<Vec<_>>();
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "Subgenres: {}", facets.subgenres.join(", ")).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout, "Spice levels: {}", spice.join(", ")).or_raise(|| ErrorKind::Output)?;
    let written = match years {
        Some((from, to)) => writeln!(stdout, "Years: {from} to {to}"),
        None => writeln!(stdout, "Years: none"),
    };
    written.or_raise(|| ErrorKind::Output)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).or_raise(|| ErrorKind::Output)?;
    writeln!(stdout).or_raise(|| ErrorKind::Output)
}

pub fn print_books(books: &[Book], json: bool) -> Result<()> {
    if json {
        return print_json(books);
    }
    let mut stdout = std::io::stdout().lock();
    for book in books {
        writeln!(stdout, "{}", book_line(book)).or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}
