//! Command-line arguments.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Args, Parser, Subcommand};
use picklelit_extract::models::{BookKey, CurationPatch, Runtime, SpiceLevel};

#[derive(Debug, Parser)]
#[command(name = "picklelit", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PICKLELIT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Catalog database, overriding the configured one
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,
    /// More logging; repeat for even more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Report what would be written without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a book's metadata unless a fresh record is already catalogued
    Scrape {
        title: String,
        /// Days before a record counts as stale (0 forces a refresh)
        #[arg(long)]
        max_age_days: Option<u32>,
        /// Check for an audiobook too
        #[arg(long)]
        audio: bool,
    },
    /// Catalog new books from a subject listing
    Discover {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Earliest first publication year
        #[arg(long = "from")]
        year_from: Option<i32>,
        /// Latest first publication year
        #[arg(long = "to")]
        year_to: Option<i32>,
        /// Check each new book for an audiobook
        #[arg(long)]
        audio: bool,
    },
    /// Check catalogued books for audiobooks
    Audio {
        /// Days before an audiobook check counts as stale (0 re-checks everything)
        #[arg(long)]
        max_days: Option<u32>,
        /// Only books whose title contains this
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Browse the catalog, most recently updated first
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        #[arg(long)]
        json: bool,
    },
    /// Filter the catalog
    Search(SearchArgs),
    /// Show one book
    Show {
        #[command(flatten)]
        book: BookArgs,
        #[arg(long)]
        json: bool,
    },
    /// Edit a book's curated fields
    Edit(EditArgs),
    /// Remove a book from the catalog
    Remove {
        #[command(flatten)]
        book: BookArgs,
    },
    /// List the subgenres, spice levels and years in use
    Facets {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
pub struct BookArgs {
    pub title: String,
    /// First listed author (omit for books without one)
    pub author: Option<String>,
}

impl BookArgs {
    pub fn key(&self) -> BookKey {
        BookKey::new(&self.title, self.author.as_deref())
    }
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Title contains
    #[arg(long)]
    pub title: Option<String>,
    /// Any author contains
    #[arg(long)]
    pub author: Option<String>,
    /// Publication years, like `2015..2020` (inclusive) or `2019`
    #[arg(long, value_parser = parse_years)]
    pub years: Option<RangeInclusive<i32>>,
    /// Spice levels, like `2..3.5` (inclusive) or `4`
    #[arg(long, value_parser = parse_spice_range)]
    pub spice: Option<RangeInclusive<SpiceLevel>>,
    /// Any of these subgenres (repeatable)
    #[arg(long = "subgenre")]
    pub subgenres: Vec<String>,
    /// Only books with an audiobook
    #[arg(long)]
    pub audiobook: bool,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub book: BookArgs,
    /// `3`, `3.5`, `3/5` or chili peppers
    #[arg(long, value_parser = parse_spice)]
    pub spice: Option<SpiceLevel>,
    #[arg(long)]
    pub subgenre: Option<String>,
    #[arg(long, value_parser = clap::builder::BoolishValueParser::new())]
    pub kindle_unlimited: Option<bool>,
    /// Comma separated
    #[arg(long, value_delimiter = ',')]
    pub graphic_audio_voices: Option<Vec<String>>,
    /// Like `10 hrs and 5 mins`
    #[arg(long, value_parser = parse_runtime)]
    pub graphic_audio_time: Option<Runtime>,
}

impl EditArgs {
    pub fn patch(&self) -> CurationPatch {
        CurationPatch {
            spice_level: self.spice,
            subgenre: self.subgenre.clone(),
            kindle_unlimited: self.kindle_unlimited,
            graphic_audio_voices: self.graphic_audio_voices.clone(),
            graphic_audio_runtime: self.graphic_audio_time,
        }
    }
}

fn parse_range<T: Copy + PartialOrd>(
    s: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<RangeInclusive<T>, String> {
    let (start, end) = match s.split_once("..=").or_else(|| s.split_once("..")) {
        Some((start, end)) => (parse(start)?, parse(end)?),
        None => {
            let single = parse(s)?;
            (single, single)
        },
    };
    if start > end {
        return Err(format!("range {s} is empty"));
    }
    Ok(start..=end)
}

pub fn parse_years(s: &str) -> Result<RangeInclusive<i32>, String> {
    parse_range(s, |year| year.trim().parse::<i32>().map_err(|_| format!("invalid year: {year}")))
}

pub fn parse_spice(s: &str) -> Result<SpiceLevel, String> {
    SpiceLevel::from_str(s).map_err(|_| format!("invalid spice level: {s}"))
}

pub fn parse_spice_range(s: &str) -> Result<RangeInclusive<SpiceLevel>, String> {
    parse_range(s, parse_spice)
}

pub fn parse_runtime(s: &str) -> Result<Runtime, String> {
    Runtime::from_str(s).map_err(|_| format!("invalid runtime: {s}"))
}
