//! SQLite book catalog.
//!
//! One table, one row per book. A row is identified by the book's normalized
//! title and first author ([`BookKey`](picklelit_extract::models::BookKey)),
//! so repeated fetches of the same book update in place instead of piling up
//! duplicates. ISBNs are indexed but not unique: editions share them.
//!
//! Columns fall into three groups:
//! - **source metadata**, replaced by newer fetches but never erased by empty ones,
//! - **curation** (spice level, subgenre, ...), only ever written by hand,
//! - **audiobook check**, written together with the date of the check.

mod db;
pub mod error;
mod filter;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::filter::{BookFilter, Facets};
pub use crate::repo::{Repository, UpsertOutcome};
