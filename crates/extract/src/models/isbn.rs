use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Which of the two ISBN formats a value uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsbnKind {
    Isbn10,
    Isbn13,
}

/// A checksum-validated ISBN, stored without hyphens or spaces.
///
/// # Examples
///
/// ```
/// use picklelit_extract::models::{Isbn, IsbnKind};
///
/// let isbn: Isbn = "0-306-40615-2".parse().unwrap();
/// assert_eq!(isbn.kind(), IsbnKind::Isbn10);
/// assert_eq!(isbn.to_isbn13().as_str(), "9780306406157");
/// assert!("0-306-40615-3".parse::<Isbn>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
#[cfg_attr(feature = "serialize", serde(transparent))]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '-' | ' ' | '\u{2010}' | '\u{2011}'))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        let valid = match normalized.len() {
            10 => Self::isbn10_checksum(&normalized),
            13 => Self::isbn13_checksum(&normalized),
            _ => false,
        };
        if !valid {
            exn::bail!(ErrorKind::ParseError {
                field: "isbn",
                value: raw.to_string(),
            });
        }
        Ok(Self(normalized))
    }

    fn isbn10_checksum(digits: &str) -> bool {
        let mut sum = 0u32;
        for (i, c) in digits.chars().enumerate() {
            let value = match (i, c) {
                (9, 'X') => 10,
                (_, c) => match c.to_digit(10) {
                    Some(d) => d,
                    None => return false,
                },
            };
            sum += value * (10 - i as u32);
        }
        sum % 11 == 0
    }

    fn isbn13_checksum(digits: &str) -> bool {
        let mut sum = 0u32;
        for (i, c) in digits.chars().enumerate() {
            let Some(d) = c.to_digit(10) else {
                return false;
            };
            sum += if i % 2 == 0 { d } else { d * 3 };
        }
        sum % 10 == 0
    }

    pub fn kind(&self) -> IsbnKind {
        match self.0.len() {
            10 => IsbnKind::Isbn10,
            _ => IsbnKind::Isbn13,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to the 13-digit form (`978` prefix, recomputed check digit).
    /// ISBN-13 values are returned unchanged.
    pub fn to_isbn13(&self) -> Isbn {
        if self.kind() == IsbnKind::Isbn13 {
            return self.clone();
        }
        let body = format!("978{}", &self.0[..9]);
        let sum: u32 = body
            .chars()
            .filter_map(|c| c.to_digit(10))
            .enumerate()
            .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
            .sum();
        let check = (10 - sum % 10) % 10;
        Isbn(format!("{body}{check}"))
    }
}

impl FromStr for Isbn {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for Isbn {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
