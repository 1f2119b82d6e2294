//! DB2-style timestamps (`YYYY-MM-DD-HH.MM.SS.NNNNNN`).

use crate::error::{PostingError, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// Output pattern, always six fractional digits.
pub const DB2_FORMAT: &str = "%Y-%m-%d-%H.%M.%S%.6f";

const DB2_PARSE: &str = "%Y-%m-%d-%H.%M.%S%.f";
const DB2_LEN: usize = 26;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A timestamp in the DB2 interchange format.
///
/// # Examples
///
/// ```
/// use carddemo_posting::Db2Timestamp;
///
/// let ts: Db2Timestamp = "2024-03-15-10.30.45.120000".parse().unwrap();
/// assert_eq!(ts.to_string(), "2024-03-15-10.30.45.120000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Db2Timestamp(NaiveDateTime);

impl Db2Timestamp {
    /// Current local time at hundredth-of-a-second precision.
    ///
    /// The last four fractional digits are always `0000`, matching the
    /// mainframe `CURRENT-DATE` filler.
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        let hundredths = (now.nanosecond() / 10_000_000).min(99);
        Db2Timestamp(now.with_nanosecond(hundredths * 10_000_000).unwrap_or(now))
    }
}

impl FromStr for Db2Timestamp {
    type Err = PostingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != DB2_LEN {
            return Err(PostingError::InvalidTimestamp(trimmed.to_string()));
        }
        NaiveDateTime::parse_from_str(trimmed, DB2_PARSE)
            .map(Db2Timestamp)
            .map_err(|_| PostingError::InvalidTimestamp(trimmed.to_string()))
    }
}

impl fmt::Display for Db2Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DB2_FORMAT))
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|e| PostingError::InvalidArgument(format!("invalid date '{}': {}", trimmed, e)))
}

/// Parses the date portion (first ten characters) of a timestamp string.
///
/// Only the date is inspected, so truncated or sloppy time parts are tolerated.
pub fn date_portion(timestamp: &str) -> Result<NaiveDate> {
    let trimmed = timestamp.trim();
    let date = trimmed.get(..10).ok_or_else(|| {
        PostingError::InvalidArgument(format!("timestamp '{}' has no date portion", trimmed))
    })?;
    parse_date(date)
}

#[cfg(test)]
pub(crate) fn matches_db2_pattern(text: &str) -> bool {
    // \d{4}-\d{2}-\d{2}-\d{2}\.\d{2}\.\d{2}\.\d{6}
    const SHAPE: &[u8] = b"dddd-dd-dd-dd.dd.dd.dddddd";
    text.len() == SHAPE.len()
        && text.bytes().zip(SHAPE).all(|(c, &s)| match s {
            b'd' => c.is_ascii_digit(),
            sep => c == sep,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_matches_pattern_with_filler() {
        let text = Db2Timestamp::now().to_string();
        assert!(matches_db2_pattern(&text), "bad timestamp {}", text);
        assert!(text.ends_with("0000"));
    }

    #[test]
    fn test_parse_and_format() {
        let ts: Db2Timestamp = "2023-12-31-23.59.59.999999".parse().unwrap();
        assert_eq!(ts.to_string(), "2023-12-31-23.59.59.999999");
        assert!(ts < "2024-01-01-00.00.00.000000".parse().unwrap());
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!("2023-12-31 23:59:59".parse::<Db2Timestamp>().is_err());
        assert!("2023-12-31-23.59.59".parse::<Db2Timestamp>().is_err());
        assert!("2023-02-30-10.00.00.000000".parse::<Db2Timestamp>().is_err());
    }

    #[test]
    fn test_date_portion() {
        assert_eq!(
            date_portion("2024-01-15-08.00.00.000000").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            date_portion("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(date_portion("2024-01").is_err());
        assert!(date_portion("garbage-in-here").is_err());
    }

    #[test]
    fn test_pattern_matcher() {
        assert!(matches_db2_pattern("2024-01-15-08.00.00.120000"));
        assert!(!matches_db2_pattern("2024-01-15-08:00:00.120000"));
        assert!(!matches_db2_pattern("2024-01-15-08.00.00.12"));
    }
}
