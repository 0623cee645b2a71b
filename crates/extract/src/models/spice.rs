use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::consts::{CHILI, FRACTION_REGEX, VARIATION_SELECTOR};
use crate::error::{Error, ErrorKind, Result};

/// Subjective romance-content intensity, from 0 to 5 in half steps.
///
/// Stored internally as a count of half steps so that it is `Eq`, `Ord` and
/// `Hash` (no floating point comparisons).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpiceLevel(u8);

impl SpiceLevel {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(10);

    /// Construct from a count of half steps (`7` is "3.5").
    pub fn from_half_steps(half_steps: u8) -> Result<Self> {
        if half_steps > Self::MAX.0 {
            exn::bail!(ErrorKind::ParseError {
                field: "spice_level",
                value: format!("{} half steps", half_steps),
            });
        }
        Ok(Self(half_steps))
    }

    pub fn from_f32(value: f32) -> Result<Self> {
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled.fract() != 0.0 || !(0.0..=10.0).contains(&doubled) {
            exn::bail!(ErrorKind::ParseError {
                field: "spice_level",
                value: value.to_string(),
            });
        }
        Ok(Self(doubled as u8))
    }

    pub fn half_steps(&self) -> u8 {
        self.0
    }

    pub fn as_f32(&self) -> f32 {
        f32::from(self.0) / 2.0
    }
}

impl FromStr for SpiceLevel {
    type Err = Error;
    /// Accepts `"3"`, `"3.5"`, `"3/5"` and chili glyphs (`"🌶️🌶️🌶️"`).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || ErrorKind::ParseError {
            field: "spice_level",
            value: s.to_string(),
        };
        if trimmed.is_empty() {
            exn::bail!(invalid());
        }
        if trimmed.chars().all(|c| c == CHILI || c == VARIATION_SELECTOR || c.is_whitespace()) {
            let chilis = trimmed.chars().filter(|c| *c == CHILI).count();
            let chilis = u8::try_from(chilis).ok().filter(|c| *c <= 5);
            return match chilis {
                Some(c) if c > 0 => Self::from_half_steps(c * 2),
                _ => exn::bail!(invalid()),
            };
        }
        let number = match FRACTION_REGEX.captures(trimmed) {
            Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or_default(),
            None => trimmed,
        };
        match number.parse::<f32>() {
            Ok(value) => Self::from_f32(value),
            Err(_) => exn::bail!(invalid()),
        }
    }
}

impl Display for SpiceLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.0 % 2 {
            0 => write!(f, "{}", self.0 / 2),
            _ => write!(f, "{}.5", self.0 / 2),
        }
    }
}

#[cfg(feature = "serialize")]
impl serde::Serialize for SpiceLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f32(self.as_f32())
    }
}
