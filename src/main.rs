mod cli;
mod error;
mod output;

use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use exn::{OptionExt, ResultExt};
use futures::{Stream, StreamExt};
use picklelit_catalog::{BookFilter, Database, Repository};
use picklelit_config::Config;
use picklelit_library::audio::refresh_audiobooks;
use picklelit_library::discover::{DiscoverOptions, discover};
use picklelit_library::{Context, Outcome, ScrapeOptions, Staleness, scrape_and_update};
use picklelit_source::{AudibleCatalog, GoogleBooks, HttpClient, OpenLibrary};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};

/// Exit status when a scrape finds nothing, as opposed to failing.
const NOT_FOUND: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    match run(cli).await {
        Ok(status) => status,
        Err(err) => {
            eprintln!("{:?}", error::report(&err));
            ExitCode::FAILURE
        },
    }
}

/// Log to stderr at a level picked by `-q`/`-v`; `RUST_LOG` wins when set.
fn init_tracing(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let path = match &cli.database {
        Some(path) => path.clone(),
        None => config.database_path().or_raise(|| ErrorKind::Config)?,
    };
    let db = Database::connect(&path).await.or_raise(|| ErrorKind::Database)?;
    if cli.dry_run {
        tracing::warn!("dry run: nothing will be written to {}", path.display());
    }
    let repo = Repository::new(db.pool().clone(), cli.dry_run);
    let status = dispatch(cli.command, &config, repo).await;
    db.close().await;
    status
}

fn context(config: &Config, catalog: Repository) -> Result<Context> {
    let http = HttpClient::new(&config.http.user_agent, config.http.timeout()).or_raise(|| ErrorKind::Source)?;
    let sources = &config.sources;
    let metadata = Arc::new(GoogleBooks::new(http.clone(), &sources.google_books));
    let subjects = Arc::new(OpenLibrary::new(http.clone(), &sources.open_library));
    let audiobooks = Arc::new(AudibleCatalog::new(http, &sources.audible_api, &sources.audible_site));
    Ok(Context::new(catalog, metadata, subjects, audiobooks).with_request_delay(config.http.request_delay()))
}

async fn dispatch(command: Command, config: &Config, repo: Repository) -> Result<ExitCode> {
    match command {
        Command::Scrape { title, max_age_days, audio } => {
            let ctx = context(config, repo)?;
            let options = ScrapeOptions {
                staleness: Staleness::new(max_age_days.unwrap_or(config.staleness.metadata_days)),
                with_audiobook: audio,
            };
            let outcome = scrape_and_update(&ctx, &title, options)
                .await
                .or_raise(|| ErrorKind::Command("scrape"))?;
            let label = match &outcome {
                Outcome::Fresh(_) => "fresh",
                Outcome::Refreshed(_) => "refreshed",
                Outcome::NoChange(_) => "unchanged",
                Outcome::Added(_) => "added",
                Outcome::NotFound => {
                    eprintln!("no book found for {title:?}");
                    return Ok(ExitCode::from(NOT_FOUND));
                },
            };
            if let Some(book) = outcome.book() {
                println!("{label}: {}", output::book_line(book));
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Discover { subject, pages, page_size, year_from, year_to, audio } => {
            let ctx = context(config, repo)?;
            let defaults = &config.discover;
            let options = DiscoverOptions {
                subject: subject.unwrap_or_else(|| defaults.subject.clone()),
                pages: pages.unwrap_or(defaults.pages),
                page_size: page_size.unwrap_or(defaults.page_size),
                editions_limit: defaults.editions_limit,
                years: year_from.unwrap_or(defaults.year_from)..=year_to.unwrap_or(defaults.year_to),
                with_audiobook: audio,
            };
            let failures = drain(discover(&ctx, options), output::discover_line).await;
            Ok(status(failures))
        },
        Command::Audio { max_days, title, limit } => {
            let staleness = Staleness::new(max_days.unwrap_or(config.staleness.audio_days));
            let books = match &title {
                Some(title) => {
                    let mut books = repo.find_by_title(title).await.or_raise(|| ErrorKind::Catalog)?;
                    books.truncate(limit as usize);
                    books
                },
                None => repo
                    .list_audio_candidates(staleness.fresh_since_today(), limit)
                    .await
                    .or_raise(|| ErrorKind::Catalog)?,
            };
            let ctx = context(config, repo)?;
            let failures = drain(refresh_audiobooks(&ctx, books, staleness), output::audio_line).await;
            Ok(status(failures))
        },
        Command::List { limit, offset, json } => {
            let books = repo.list(limit, offset).await.or_raise(|| ErrorKind::Catalog)?;
            output::print_books(&books, json)?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Search(args) => {
            let filter = BookFilter {
                title: args.title,
                author: args.author,
                years: args.years,
                spice: args.spice,
                subgenres: args.subgenres,
                audiobook_only: args.audiobook,
                limit: args.limit,
            };
            let books = repo.search(&filter).await.or_raise(|| ErrorKind::Catalog)?;
            output::print_books(&books, args.json)?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Show { book, json } => {
            let key = book.key();
            let book = repo
                .get(&key)
                .await
                .or_raise(|| ErrorKind::Catalog)?
                .ok_or_raise(|| ErrorKind::NotFound(key.to_string()))?;
            match json {
                true => output::print_json(&book)?,
                false => print!("{}", output::book_detail(&book)),
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Edit(args) => {
            let patch = args.patch();
            if patch.is_empty() {
                exn::bail!(ErrorKind::NothingToDo("edit"));
            }
            let key = args.book.key();
            if !repo.update_curation(&key, &patch).await.or_raise(|| ErrorKind::Catalog)? {
                exn::bail!(ErrorKind::NotFound(key.to_string()));
            }
            match repo.is_dry_run() {
                true => println!("would update {key}"),
                false => {
                    let book = repo.require(&key).await.or_raise(|| ErrorKind::Catalog)?;
                    println!("updated: {}", output::book_line(&book));
                },
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Remove { book } => {
            let key = book.key();
            if !repo.delete(&key).await.or_raise(|| ErrorKind::Catalog)? {
                exn::bail!(ErrorKind::NotFound(key.to_string()));
            }
            match repo.is_dry_run() {
                true => println!("would remove {key}"),
                false => println!("removed {key}"),
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Facets { json } => {
            let facets = repo.facets().await.or_raise(|| ErrorKind::Catalog)?;
            output::print_facets(&facets, json)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}

/// Print every event of a progress stream, reporting errors as they arrive.
/// Returns how many errors there were.
async fn drain<T, E>(
    stream: impl Stream<Item = std::result::Result<T, exn::Exn<E>>>,
    line: impl Fn(&T) -> Option<String>,
) -> usize
where
    E: std::error::Error + Send + Sync + 'static,
{
    let mut stream = pin!(stream);
    let mut failures = 0;
    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                if let Some(line) = line(&event) {
                    println!("{line}");
                }
            },
            Err(err) => {
                failures += 1;
                eprintln!("{:?}", error::report(&err));
            },
        }
    }
    failures
}

fn status(failures: usize) -> ExitCode {
    match failures {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
