//! Timestamp utilities
//!
//! Timestamps are stored as INTEGER microseconds since the Unix epoch, so
//! every value handed to the database is first truncated to that precision.

use crate::{Error, Result};
use chrono::{DateTime, SubsecRound, Utc};

/// Get current UTC timestamp, truncated to microsecond precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Convert a timestamp to its stored representation
pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Convert a stored representation back to a timestamp
pub fn from_micros(column: &str, micros: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| Error::CorruptRow(format!("{column} {micros} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_now_has_no_sub_microsecond_part() {
        let timestamp = now();
        assert_eq!(timestamp.nanosecond() % 1_000, 0);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_micros_round_trip_is_lossless() {
        let ts = now();
        assert_eq!(from_micros("created_at", to_micros(ts)).unwrap(), ts);
    }

    #[test]
    fn test_from_micros_rejects_out_of_range() {
        let err = from_micros("published_at", i64::MAX).unwrap_err();
        assert!(matches!(err, Error::CorruptRow(_)));
    }
}
