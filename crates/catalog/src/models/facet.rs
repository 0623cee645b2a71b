//! JSON encoding of the list-valued columns.

use exn::ResultExt;
use facet_json::{from_str as from_json, to_string as to_json};

use crate::error::{ErrorKind, Result};

/// A person or subject name inside a JSON list column.
#[derive(facet::Facet)]
#[cfg_attr(test, derive(Debug, PartialEq))]
#[facet(transparent)]
pub(crate) struct NameProxy(String);

pub(crate) fn encode_names(names: &[String], column: &'static str) -> Result<String> {
    let proxies = names.iter().cloned().map(NameProxy).collect::<Vec<_>>();
    to_json(&proxies).or_raise(|| ErrorKind::InvalidData(column))
}

pub(crate) fn decode_names(json: &str, column: &'static str) -> Result<Vec<String>> {
    Ok(from_json::<Vec<NameProxy>>(json)
        .or_raise(|| ErrorKind::InvalidData(column))?
        .into_iter()
        .map(|name| name.0)
        .collect())
}
