use std::ops::RangeInclusive;

use picklelit_extract::models::{BookKey, SpiceLevel};
use sqlx::{QueryBuilder, Sqlite};

/// Browse filter over the catalog. Every criterion that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of any author
    pub author: Option<String>,
    /// Inclusive; books without a year never match
    pub years: Option<RangeInclusive<i32>>,
    /// Inclusive; books without a spice level never match
    pub spice: Option<RangeInclusive<SpiceLevel>>,
    /// Any of these subgenres (case-insensitive); empty means any
    pub subgenres: Vec<String>,
    /// Only books whose last audiobook check found one
    pub audiobook_only: bool,
    pub limit: Option<u32>,
}

/// Distinct values present in the catalog, for building filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Facets {
    pub subgenres: Vec<String>,
    pub spice_levels: Vec<SpiceLevel>,
    pub years: Option<RangeInclusive<i32>>,
}

/// Normalize a search fragment the same way keys are normalized and turn it
/// into a `LIKE` pattern, escaping `LIKE` wildcards with `\`.
pub(crate) fn like_pattern(fragment: &str) -> String {
    let normalized = BookKey::normalize(fragment);
    let mut pattern = String::with_capacity(normalized.len() + 2);
    pattern.push('%');
    for c in normalized.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl BookFilter {
    /// Append this filter's `WHERE` clause (if any), ordering and limit.
    pub(crate) fn push_sql<'a>(&'a self, query: &mut QueryBuilder<'a, Sqlite>) {
        let mut first = true;
        let mut and = |query: &mut QueryBuilder<'a, Sqlite>| {
            query.push(if first { " WHERE " } else { " AND " });
            first = false;
        };
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            and(query);
            query.push("title_key LIKE ").push_bind(like_pattern(title)).push(" ESCAPE '\\'");
        }
        if let Some(author) = self.author.as_deref().filter(|a| !a.trim().is_empty()) {
            and(query);
            query
                .push("EXISTS (SELECT 1 FROM json_each(books.author_keys) WHERE json_each.value LIKE ")
                .push_bind(like_pattern(author))
                .push(" ESCAPE '\\')");
        }
        if let Some(years) = &self.years {
            and(query);
            query
                .push("year_published BETWEEN ")
                .push_bind(i64::from(*years.start()))
                .push(" AND ")
                .push_bind(i64::from(*years.end()));
        }
        if let Some(spice) = &self.spice {
            and(query);
            query
                .push("spice_level BETWEEN ")
                .push_bind(i64::from(spice.start().half_steps()))
                .push(" AND ")
                .push_bind(i64::from(spice.end().half_steps()));
        }
        if !self.subgenres.is_empty() {
            and(query);
            query.push("subgenre_key IN (");
            let mut list = query.separated(", ");
            for subgenre in &self.subgenres {
                list.push_bind(BookKey::normalize(subgenre));
            }
            list.push_unseparated(")");
        }
        if self.audiobook_only {
            and(query);
            query.push("audiobook = 1");
        }
        query.push(" ORDER BY last_updated IS NULL, last_updated DESC, id DESC");
        if let Some(limit) = self.limit {
            query.push(" LIMIT ").push_bind(i64::from(limit));
        }
    }
}
