use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::ValidationError;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const MAX_SECONDS: u64 = i64::MAX as u64 / 1_000_000_000;

/// Non-negative duration with whole-second resolution.
///
/// Written as `<count><unit>` where unit is one of `s`, `m`, `h`, `d`
/// (`"90s"`, `"15m"`, `"1h"`, `"7d"`). Display picks the largest unit that
/// divides the span exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Span(u64);

impl Span {
    pub const ZERO: Self = Self(0);

    pub const fn seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self(minutes * MINUTE)
    }

    pub const fn hours(hours: u64) -> Self {
        Self(hours * HOUR)
    }

    pub const fn days(days: u64) -> Self {
        Self(days * DAY)
    }

    pub const fn as_seconds(self) -> u64 {
        self.0
    }

    pub const fn as_nanos(self) -> i128 {
        self.0 as i128 * 1_000_000_000
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn as_duration(self) -> Duration {
        Duration::seconds(self.0 as i64)
    }

    /// True when `self` is a whole multiple of a non-zero `other`.
    pub const fn is_multiple_of(self, other: Self) -> bool {
        other.0 != 0 && self.0 % other.0 == 0
    }

    pub fn require_positive(self, field: &'static str) -> Result<Self, ValidationError> {
        if self.is_zero() {
            return Err(ValidationError::ZeroSpan { field });
        }
        Ok(self)
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (count, unit) = match self.0 {
            0 => (0, "h"),
            s if s % DAY == 0 && s >= 7 * DAY => (s / DAY, "d"),
            s if s % HOUR == 0 => (s / HOUR, "h"),
            s if s % MINUTE == 0 => (s / MINUTE, "m"),
            s => (s, "s"),
        };
        write!(f, "{count}{unit}")
    }
}

impl FromStr for Span {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let invalid = || ValidationError::InvalidSpan {
            value: value.to_owned(),
        };

        let split = normalized
            .find(|ch: char| !ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = normalized.split_at(split);
        let count: u64 = digits.parse().map_err(|_| invalid())?;
        let scale = match unit {
            "s" => 1,
            "m" => MINUTE,
            "h" => HOUR,
            "d" => DAY,
            _ => return Err(invalid()),
        };

        count
            .checked_mul(scale)
            .filter(|seconds| *seconds <= MAX_SECONDS)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Span {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Span> for String {
    fn from(value: Span) -> Self {
        value.to_string()
    }
}
