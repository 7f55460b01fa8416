use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::{Span, ValidationError};

/// RFC3339 timestamp guaranteed to be UTC.
///
/// Bucket and grid arithmetic (`floor_to`, `ceil_to`, `is_aligned_to`) is
/// measured from the Unix epoch so that boundaries are reproducible across
/// runs and across assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let parsed = OffsetDateTime::parse(input, &Rfc3339).map_err(|_| {
            ValidationError::TimestampNotUtc {
                value: input.to_owned(),
            }
        })?;

        Self::from_offset_datetime(parsed).map_err(|_| ValidationError::TimestampNotUtc {
            value: input.to_owned(),
        })
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Result<Self, ValidationError> {
        if value.offset() != UtcOffset::UTC {
            return Err(ValidationError::TimestampNotUtc {
                value: value
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| String::from("<unformattable>")),
            });
        }

        Ok(Self(value))
    }

    pub fn from_unix_seconds(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(Self)
            .map_err(|_| ValidationError::TimestampOutOfRange { value: seconds })
    }

    fn from_unix_nanos(nanos: i128) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .map(Self)
    }

    pub fn unix_nanos(self) -> i128 {
        self.0.unix_timestamp_nanos()
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn checked_add(self, span: Span) -> Option<Self> {
        self.0.checked_add(span.as_duration()).map(Self)
    }

    pub fn checked_sub(self, span: Span) -> Option<Self> {
        self.0.checked_sub(span.as_duration()).map(Self)
    }

    /// Round down to the previous multiple of `span` since the epoch.
    /// A zero span leaves the timestamp untouched.
    pub fn floor_to(self, span: Span) -> Option<Self> {
        let step = span.as_nanos();
        if step == 0 {
            return Some(self);
        }
        let nanos = self.unix_nanos();
        Self::from_unix_nanos(nanos.div_euclid(step) * step)
    }

    /// Round up to the next multiple of `span` since the epoch.
    pub fn ceil_to(self, span: Span) -> Option<Self> {
        let step = span.as_nanos();
        if step == 0 {
            return Some(self);
        }
        let nanos = self.unix_nanos();
        let floored = nanos.div_euclid(step) * step;
        if floored == nanos {
            Some(self)
        } else {
            Self::from_unix_nanos(floored + step)
        }
    }

    pub fn is_aligned_to(self, span: Span) -> bool {
        let step = span.as_nanos();
        step == 0 || self.unix_nanos().rem_euclid(step) == 0
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| format!("@{}", self.0.unix_timestamp()))
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UtcDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(input: &str) -> UtcDateTime {
        UtcDateTime::parse(input).expect("timestamp")
    }

    #[test]
    fn parses_utc_timestamp() {
        let parsed = ts("2024-01-01T00:00:00Z");
        assert_eq!(parsed.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn rejects_non_utc_timestamp() {
        let err = UtcDateTime::parse("2024-01-01T01:00:00+01:00").expect_err("must fail");
        assert!(matches!(err, ValidationError::TimestampNotUtc { .. }));
    }

    #[test]
    fn floors_and_ceils_to_epoch_grid() {
        let value = ts("2024-01-01T10:20:00Z");
        let hour = Span::hours(1);
        assert_eq!(value.floor_to(hour), Some(ts("2024-01-01T10:00:00Z")));
        assert_eq!(value.ceil_to(hour), Some(ts("2024-01-01T11:00:00Z")));

        let aligned = ts("2024-01-01T10:00:00Z");
        assert_eq!(aligned.ceil_to(hour), Some(aligned));
        assert!(aligned.is_aligned_to(hour));
        assert!(!value.is_aligned_to(hour));
    }

    #[test]
    fn four_hour_buckets_follow_the_epoch_not_midnight_offsets() {
        let value = ts("2024-01-01T05:59:59Z");
        assert_eq!(
            value.floor_to(Span::hours(4)),
            Some(ts("2024-01-01T04:00:00Z"))
        );
    }

    #[test]
    fn span_arithmetic_round_trips() {
        let value = ts("2024-03-10T00:00:00Z");
        let later = value.checked_add(Span::days(2)).expect("in range");
        assert_eq!(later, ts("2024-03-12T00:00:00Z"));
        assert_eq!(later.checked_sub(Span::days(2)), Some(value));
    }
}
