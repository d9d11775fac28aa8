//! Shared data types for the UniNear server.
//!
//! Event rows are kept as loosely typed [`Record`]s: the remote store owns the
//! table schema, so whatever columns it returns are passed through to clients
//! unchanged. Inbound data is typed by the [`crate::schema`] module instead.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// A single row as stored by (or sent to) the remote store.
pub type Record = Map<String, Value>;

/// Naive datetime layouts accepted on input, tried in order.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Offset-qualified layouts RFC 3339 parsing does not cover, tried in order.
/// `%#z` takes `+02:00`, `+0200` or `+02`; a `Z` suffix is rewritten first.
const ZONED_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

/// Output layout for naive timestamps (fractional seconds only when non-zero).
const NAIVE_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A parsed event timestamp.
///
/// Clients may send either an offset-qualified RFC 3339 value or a naive
/// local time. Naive values are kept naive so they are written back exactly
/// as the client meant them, without inventing a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// A timestamp carrying an explicit UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// A wall-clock timestamp without offset information.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Parses an ISO-8601 style string.
    ///
    /// Accepts RFC 3339 with offset (seconds optional, `Z` or `+HH:MM`),
    /// naive `YYYY-MM-DDTHH:MM:SS[.fff]` (`T` or space separated),
    /// `YYYY-MM-DDTHH:MM`, and a bare date which is read as midnight.
    /// Returns `None` for anything else.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();

        if let Ok(zoned) = DateTime::parse_from_rfc3339(input) {
            return Some(Self::Zoned(zoned));
        }

        let offset_input = match input.strip_suffix(['Z', 'z']) {
            Some(rest) => format!("{rest}+00:00"),
            None => input.to_string(),
        };
        for format in ZONED_FORMATS {
            if let Ok(zoned) = DateTime::parse_from_str(&offset_input, format) {
                return Some(Self::Zoned(zoned));
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
                return Some(Self::Naive(naive));
            }
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self::Naive)
    }

    /// Builds a UTC timestamp from Unix seconds.
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|utc| Self::Zoned(utc.fixed_offset()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zoned(zoned) => write!(f, "{}", zoned.to_rfc3339()),
            Self::Naive(naive) => write!(f, "{}", naive.format(NAIVE_OUTPUT_FORMAT)),
        }
    }
}

impl From<Timestamp> for Value {
    fn from(timestamp: Timestamp) -> Self {
        Value::String(timestamp.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Timestamp::Naive(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap(),
        )
    }

    #[test]
    fn parses_naive_iso_datetime() {
        let ts = Timestamp::parse("2025-10-15T09:00:00").expect("should parse");
        assert_eq!(ts, naive(2025, 10, 15, 9, 0, 0));
    }

    #[test]
    fn parses_space_separated_datetime() {
        let ts = Timestamp::parse("2025-10-15 09:30:15").expect("should parse");
        assert_eq!(ts, naive(2025, 10, 15, 9, 30, 15));
    }

    #[test]
    fn parses_minute_precision_datetime() {
        let ts = Timestamp::parse("2025-10-15T18:45").expect("should parse");
        assert_eq!(ts, naive(2025, 10, 15, 18, 45, 0));
    }

    #[test]
    fn parses_fractional_seconds() {
        let ts = Timestamp::parse("2025-10-15T09:00:00.250").expect("should parse");
        match ts {
            Timestamp::Naive(dt) => assert_eq!(dt.nanosecond(), 250_000_000),
            other => panic!("expected naive timestamp, got {other:?}"),
        }
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = Timestamp::parse("2025-10-15T09:00:00+02:00").expect("should parse");
        match ts {
            Timestamp::Zoned(dt) => {
                assert_eq!(dt.hour(), 9);
                assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
            }
            other => panic!("expected zoned timestamp, got {other:?}"),
        }
    }

    #[test]
    fn parses_minute_precision_with_utc_suffix() {
        let ts = Timestamp::parse("2025-10-15T09:00Z").expect("should parse");
        match ts {
            Timestamp::Zoned(dt) => {
                assert_eq!((dt.hour(), dt.minute(), dt.second()), (9, 0, 0));
                assert_eq!(dt.offset().local_minus_utc(), 0);
            }
            other => panic!("expected zoned timestamp, got {other:?}"),
        }
        assert_eq!(ts.to_string(), "2025-10-15T09:00:00+00:00");
    }

    #[test]
    fn parses_minute_precision_with_offset() {
        for input in ["2025-10-15T09:00+02:00", "2025-10-15T09:00+0200"] {
            let ts = Timestamp::parse(input).expect("should parse");
            match ts {
                Timestamp::Zoned(dt) => {
                    assert_eq!(dt.hour(), 9);
                    assert_eq!(dt.offset().local_minus_utc(), 2 * 3600, "{input}");
                }
                other => panic!("expected zoned timestamp, got {other:?}"),
            }
        }
    }

    #[test]
    fn parses_space_separated_datetime_with_offset() {
        let ts = Timestamp::parse("2025-10-15 09:30:00-05:00").expect("should parse");
        assert_eq!(ts.to_string(), "2025-10-15T09:30:00-05:00");
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let ts = Timestamp::parse("2025-10-15").expect("should parse");
        assert_eq!(ts, naive(2025, 10, 15, 0, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Timestamp::parse("not-a-date").is_none());
        assert!(Timestamp::parse("").is_none());
        assert!(Timestamp::parse("2025-13-45T09:00:00").is_none());
        assert!(Timestamp::parse("2025-10-15T09:00+25:00").is_none());
        assert!(Timestamp::parse("Z").is_none());
    }

    #[test]
    fn from_unix_seconds_is_utc() {
        let ts = Timestamp::from_unix_seconds(1_760_518_800).expect("in range");
        match ts {
            Timestamp::Zoned(dt) => {
                assert_eq!(dt.offset().local_minus_utc(), 0);
                assert_eq!(dt.year(), 2025);
            }
            other => panic!("expected zoned timestamp, got {other:?}"),
        }
    }

    #[test]
    fn naive_display_round_trips_input_form() {
        assert_eq!(naive(2025, 10, 15, 9, 0, 0).to_string(), "2025-10-15T09:00:00");
    }

    #[test]
    fn zoned_display_is_rfc3339() {
        let ts = Timestamp::parse("2025-10-15T09:00:00Z").expect("should parse");
        assert_eq!(ts.to_string(), "2025-10-15T09:00:00+00:00");
    }

    #[test]
    fn converts_into_json_string() {
        let value: Value = naive(2025, 1, 2, 3, 4, 5).into();
        assert_eq!(value, Value::String("2025-01-02T03:04:05".to_string()));
    }
}
