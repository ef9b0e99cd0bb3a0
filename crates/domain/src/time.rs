//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for attribute `last_changed` values.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert a hub-reported unix timestamp (seconds) into a [`Timestamp`].
///
/// Out-of-range values yield `None`.
#[must_use]
pub fn from_unix(seconds: i64) -> Option<Timestamp> {
    DateTime::from_timestamp(seconds, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_convert_unix_seconds() {
        let ts = from_unix(1_600_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_600_000_000);
    }

    #[test]
    fn should_reject_out_of_range_unix_seconds() {
        assert!(from_unix(i64::MAX).is_none());
    }
}
