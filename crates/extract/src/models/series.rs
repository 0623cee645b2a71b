use std::convert::Infallible;
use std::str::FromStr;

use super::clean;
use crate::consts::SERIES_REGEX;

/// A book's position within a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SeriesPosition {
    /// Series name
    pub name: String,
    /// Position in series, as printed (`"2"`, `"2.5"` for novellas)
    pub position: Option<String>,
}
impl SeriesPosition {
    pub fn new(name: impl Into<String>, position: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            position: position.map(Into::into),
        }
    }
}

impl FromStr for SeriesPosition {
    type Err = Infallible;
    /// Splits strings like `"Ice Planet Barbarians #1"`, `"Bridgertons (2)"`
    /// or `"Outlander, Book 3"` into name and position. Anything else is
    /// taken as a bare series name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = clean(s);
        if let Some(captures) = SERIES_REGEX.captures(&s)
            && let (Some(name), Some(position)) = (captures.get(1), captures.get(2))
        {
            return Ok(Self::new(name.as_str().trim(), Some(position.as_str())));
        }
        Ok(Self::new(s, None::<String>))
    }
}
