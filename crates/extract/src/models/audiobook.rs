use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use time::Date;

use crate::consts::RUNTIME_REGEX;
use crate::error::{Error, ErrorKind, Result};

/// Whether an audiobook edition was found for a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Availability {
    Available,
    Unavailable,
}
impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Yes",
            Self::Unavailable => "No",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}
impl Display for Availability {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Listening time, in whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct Runtime(u32);
impl Runtime {
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }
}
impl FromStr for Runtime {
    type Err = Error;
    /// Parses store-style runtimes such as `"Length: 10 hrs and 5 mins"`,
    /// `"1 hr"` or `"45 mins"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ErrorKind::ParseError {
            field: "runtime",
            value: s.to_string(),
        };
        let Some(captures) = RUNTIME_REGEX.captures(s.trim()) else {
            exn::bail!(invalid());
        };
        let hours = captures.get(1).map(|m| m.as_str().parse::<u32>());
        let minutes = captures.get(2).map(|m| m.as_str().parse::<u32>());
        match (hours, minutes) {
            (None, None) => exn::bail!(invalid()),
            (Some(Err(_)), _) | (_, Some(Err(_))) => exn::bail!(invalid()),
            (h, m) => {
                let h = h.and_then(|r| r.ok()).unwrap_or(0);
                let m = m.and_then(|r| r.ok()).unwrap_or(0);
                let total = h.checked_mul(60).and_then(|h| h.checked_add(m));
                total.map(Self).ok_or_else(|| Error::from(invalid()))
            },
        }
    }
}
impl Display for Runtime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let (hours, minutes) = (self.0 / 60, self.0 % 60);
        let plural = |n: u32, one: &str, many: &str| format!("{n} {}", if n == 1 { one } else { many });
        match (hours, minutes) {
            (0, m) => write!(f, "{}", plural(m, "min", "mins")),
            (h, 0) => write!(f, "{}", plural(h, "hr", "hrs")),
            (h, m) => write!(f, "{} and {}", plural(h, "hr", "hrs"), plural(m, "min", "mins")),
        }
    }
}

/// The result of one audiobook check for a book.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Audiobook {
    pub status: Availability,
    /// Narrator names, in credited order (empty when unavailable)
    pub narrators: Vec<String>,
    pub runtime: Option<Runtime>,
    /// Absolute store URL for the audiobook
    pub link: Option<String>,
    /// Date of the check (`audio_last_updated`)
    pub checked_on: Date,
}
impl Audiobook {
    pub fn unavailable(checked_on: Date) -> Self {
        Self {
            status: Availability::Unavailable,
            narrators: Vec::new(),
            runtime: None,
            link: None,
            checked_on,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status.is_available()
    }
}
