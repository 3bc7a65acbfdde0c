//! Component time range decoding.
//!
//! Flush and merge event names end with the name of the disk component
//! they produce: `<newest>_<oldest>_b`, where both stamps use the
//! `yyyy-MM-dd-HH-mm-ss-SSS` format. A flushed component covers a single
//! instant so both stamps are equal; a merged component spans from the
//! oldest stamp of its first input to the newest stamp of its last.
//!
//! Example: "2017-10-17-23-08-06-570_2017-10-17-23-08-06-570_b"

use crate::utils::config::{DATE_FORMAT, DATE_LEN, SUFFIX_LEN};
use crate::utils::error::ParseError;
use chrono::NaiveDateTime;

/// Time range encoded in a component name, as epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Oldest data in the component (second stamp)
    pub begin_millis: i64,

    /// Newest data in the component (first stamp)
    pub end_millis: i64,
}

/// Decode the time range suffix of an event name
///
/// **Public** - used by the lineage correlator
///
/// # Errors
/// * `ParseError::InvalidTimeRange` - Name too short, bad separators or bad dates
pub fn decode_time_range(name: &str) -> Result<TimeRange, ParseError> {
    let invalid = |reason: String| ParseError::InvalidTimeRange {
        name: name.to_string(),
        reason,
    };

    if name.len() < SUFFIX_LEN {
        return Err(invalid(format!(
            "expected at least {} characters, found {}",
            SUFFIX_LEN,
            name.len()
        )));
    }

    let suffix = name
        .get(name.len() - SUFFIX_LEN..)
        .ok_or_else(|| invalid("suffix is not on a character boundary".to_string()))?;
    let bytes = suffix.as_bytes();
    if bytes[DATE_LEN] != b'_'
        || bytes[DATE_LEN * 2 + 1] != b'_'
        || bytes[SUFFIX_LEN - 1] != b'b'
    {
        return Err(invalid(format!("malformed suffix '{}'", suffix)));
    }

    let newest = &suffix[..DATE_LEN];
    let oldest = &suffix[DATE_LEN + 1..DATE_LEN * 2 + 1];

    Ok(TimeRange {
        begin_millis: parse_component_time(oldest).map_err(&invalid)?,
        end_millis: parse_component_time(newest).map_err(&invalid)?,
    })
}

/// Parse one component stamp to epoch milliseconds
///
/// **Private** - internal helper for decode_time_range
fn parse_component_time(text: &str) -> Result<i64, String> {
    NaiveDateTime::parse_from_str(text, DATE_FORMAT)
        .map(|dt| dt.and_utc().timestamp_millis())
        .map_err(|e| format!("'{}': {}", text, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_component_has_equal_stamps() {
        let range =
            decode_time_range("storage/idx/2017-10-17-23-08-06-570_2017-10-17-23-08-06-570_b")
                .unwrap();
        assert_eq!(range.begin_millis, range.end_millis);
    }

    #[test]
    fn test_merge_component_begin_is_second_stamp() {
        let range =
            decode_time_range("2017-10-17-23-08-09-000_2017-10-17-23-08-06-570_b").unwrap();
        assert_eq!(range.end_millis - range.begin_millis, 2_430);
    }

    #[test]
    fn test_millisecond_resolution() {
        let a = decode_time_range("2017-10-17-23-08-06-570_2017-10-17-23-08-06-570_b").unwrap();
        let b = decode_time_range("2017-10-17-23-08-06-571_2017-10-17-23-08-06-571_b").unwrap();
        assert_eq!(b.begin_millis - a.begin_millis, 1);
    }

    #[test]
    fn test_short_name_rejected() {
        assert!(matches!(
            decode_time_range("flush"),
            Err(ParseError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn test_bad_separator_rejected() {
        assert!(decode_time_range("2017-10-17-23-08-06-570-2017-10-17-23-08-06-570_b").is_err());
    }

    #[test]
    fn test_missing_component_marker_rejected() {
        assert!(matches!(
            decode_time_range("2017-10-17-23-08-06-570_2017-10-17-23-08-06-570_x"),
            Err(ParseError::InvalidTimeRange { .. })
        ));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(decode_time_range("2017-13-17-23-08-06-570_2017-10-17-23-08-06-570_b").is_err());
    }
}
