//! Nanosecond capture timestamps.
//!
//! All arithmetic stays in integers so that splitting a timestamp into the
//! pcap seconds/microseconds pair never loses precision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub const NANOS_PER_SEC: u64 = 1_000_000_000;
pub const NANOS_PER_MICRO: u64 = 1_000;

/// Errors returned when a timestamp cannot be represented.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("empty timestamp")]
    Empty,
    #[error("invalid timestamp '{value}': {message}")]
    Invalid { value: String, message: String },
    #[error("timestamp '{value}' is outside the representable range")]
    OutOfRange { value: String },
}

/// Instant expressed as nanoseconds since the Unix epoch.
///
/// # Examples
/// ```
/// use callpcap_core::Timestamp;
///
/// let ts: Timestamp = "1700000000123456789".parse()?;
/// assert_eq!(ts.seconds(), 1_700_000_000);
/// assert_eq!(ts.subsec_micros(), 123_456);
/// # Ok::<(), callpcap_core::TimestampError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Whole seconds since the epoch.
    pub const fn seconds(self) -> u64 {
        self.0 / NANOS_PER_SEC
    }

    /// Microseconds within the current second (truncated).
    pub const fn subsec_micros(self) -> u32 {
        ((self.0 % NANOS_PER_SEC) / NANOS_PER_MICRO) as u32
    }

    /// Parse an RFC3339 date-time such as `2024-05-01T12:00:00.250Z`.
    pub fn from_rfc3339(value: &str) -> Result<Self, TimestampError> {
        let parsed =
            OffsetDateTime::parse(value, &Rfc3339).map_err(|e| TimestampError::Invalid {
                value: value.to_string(),
                message: e.to_string(),
            })?;
        let nanos = u64::try_from(parsed.unix_timestamp_nanos()).map_err(|_| {
            TimestampError::OutOfRange {
                value: value.to_string(),
            }
        })?;
        Ok(Self(nanos))
    }

    /// Format as RFC3339 (UTC). Returns `None` only if formatting fails.
    pub fn to_rfc3339(self) -> Option<String> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0))
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }
}

impl From<u64> for Timestamp {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    /// Accepts a decimal nanosecond count or an RFC3339 date-time.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TimestampError::Empty);
        }
        if value.bytes().all(|b| b.is_ascii_digit()) {
            return value
                .parse::<u64>()
                .map(Self)
                .map_err(|_| TimestampError::OutOfRange {
                    value: value.to_string(),
                });
        }
        Self::from_rfc3339(value)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(
            untagged,
            expecting = "nanoseconds as an integer or string, or an RFC3339 date-time"
        )]
        enum Raw {
            Nanos(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Nanos(nanos) => Ok(Self(nanos)),
            Raw::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Timestamp, TimestampError};

    #[test]
    fn split_keeps_full_precision() {
        let ts = Timestamp::from_nanos(1_712_345_678_999_999_999);
        assert_eq!(ts.seconds(), 1_712_345_678);
        assert_eq!(ts.subsec_micros(), 999_999);
    }

    #[test]
    fn parse_nanosecond_string() {
        let ts: Timestamp = "1700000000000001000".parse().unwrap();
        assert_eq!(ts.as_nanos(), 1_700_000_000_000_001_000);
        assert_eq!(ts.subsec_micros(), 1);
    }

    #[test]
    fn parse_rfc3339() {
        let ts: Timestamp = "2023-11-14T22:13:20.5Z".parse().unwrap();
        assert_eq!(ts.seconds(), 1_700_000_000);
        assert_eq!(ts.subsec_micros(), 500_000);
    }

    #[test]
    fn parse_rfc3339_with_offset() {
        let ts: Timestamp = "2023-11-14T19:13:20-03:00".parse().unwrap();
        assert_eq!(ts.seconds(), 1_700_000_000);
    }

    #[test]
    fn reject_pre_epoch() {
        let err = "1969-12-31T23:59:59Z".parse::<Timestamp>().unwrap_err();
        assert!(matches!(err, TimestampError::OutOfRange { .. }));
    }

    #[test]
    fn reject_garbage_and_empty() {
        assert!(matches!(
            "yesterday".parse::<Timestamp>(),
            Err(TimestampError::Invalid { .. })
        ));
        assert_eq!("  ".parse::<Timestamp>(), Err(TimestampError::Empty));
    }

    #[test]
    fn reject_overflowing_digits() {
        let err = "99999999999999999999999".parse::<Timestamp>().unwrap_err();
        assert!(matches!(err, TimestampError::OutOfRange { .. }));
    }

    #[test]
    fn deserialize_number_and_string() {
        let from_number: Timestamp = serde_json::from_str("42").unwrap();
        let from_string: Timestamp = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn rfc3339_formatting() {
        let ts = Timestamp::from_nanos(1_700_000_000_250_000_000);
        assert_eq!(ts.to_rfc3339().as_deref(), Some("2023-11-14T22:13:20.25Z"));
    }
}
