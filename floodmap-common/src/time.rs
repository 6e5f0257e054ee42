//! Timestamp utilities
//!
//! Observations carry their time as epoch milliseconds; persisted rows use
//! `DateTime<Utc>`. These helpers convert between the two.

use chrono::{DateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a UTC timestamp to epoch milliseconds
pub fn to_epoch_ms(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Convert epoch milliseconds to a UTC timestamp
///
/// Out-of-range values clamp to the Unix epoch rather than failing; stored
/// rows are written by this crate and are always in range.
pub fn from_epoch_ms(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
}

/// Parse an RFC 3339 timestamp (as used by alert feeds) into epoch milliseconds
pub fn parse_rfc3339_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_now_ms_matches_seconds() {
        let ms = now_ms();
        assert!(ms > 946_684_800_000);
    }

    #[test]
    fn test_epoch_ms_conversion_is_exact() {
        let millis = 1_700_000_123_456;
        let dt = from_epoch_ms(millis);
        assert_eq!(to_epoch_ms(&dt), millis);
    }

    #[test]
    fn test_from_epoch_ms_zero() {
        assert_eq!(from_epoch_ms(0), DateTime::<Utc>::default());
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        // 2024-05-01T12:00:00-05:00 == 17:00:00Z
        let ms = parse_rfc3339_ms("2024-05-01T12:00:00-05:00").unwrap();
        let expected = parse_rfc3339_ms("2024-05-01T17:00:00Z").unwrap();
        assert_eq!(ms, expected);
    }

    #[test]
    fn test_parse_rfc3339_rejects_garbage() {
        assert!(parse_rfc3339_ms("yesterday").is_none());
    }
}
