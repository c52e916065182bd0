//! Helpers for the timestamps that appear in directory input files.

use crate::{Error, Result};

use std::time::{Duration, SystemTime};

/// Parse a wall-clock time, encoded in Iso8601 format with an intervening
/// space between the date and time.
///
/// (Example: "2020-10-09 17:38:12")
pub fn parse_iso8601_sp(s: &str) -> Result<SystemTime> {
    use chrono::{DateTime, NaiveDateTime, Utc};
    let d = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| Error::BadTime(s.to_string(), e.to_string()))?;
    let dt = DateTime::<Utc>::from_utc(d, Utc);
    Ok(dt.into())
}

/// Convert a count of seconds since the UNIX epoch into a SystemTime.
///
/// Returns None if the result can't be represented.
pub fn from_unix_secs(secs: u64) -> Option<SystemTime> {
    SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs))
}

/// Return how long ago `then` was, as of `now`.
///
/// Times in the future are treated as having no age at all.
pub fn age(now: SystemTime, then: SystemTime) -> Duration {
    now.duration_since(then).unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn iso_time() -> Result<()> {
        let t = parse_iso8601_sp("2020-09-29 13:36:33")?;
        assert_eq!(Some(t), from_unix_secs(1601386593));

        assert!(parse_iso8601_sp("2020-FF-29 13:36:33").is_err());
        assert!(parse_iso8601_sp("2020-09-29Q13:99:33").is_err());
        assert!(parse_iso8601_sp("2020-09-29").is_err());
        Ok(())
    }

    #[test]
    fn ages() {
        let t0 = from_unix_secs(1000).unwrap();
        let t1 = from_unix_secs(1500).unwrap();
        assert_eq!(age(t1, t0), Duration::from_secs(500));
        assert_eq!(age(t0, t1), Duration::from_secs(0));
    }

    #[test]
    fn unix_overflow() {
        assert_eq!(from_unix_secs(0), Some(SystemTime::UNIX_EPOCH));
        assert_eq!(from_unix_secs(u64::MAX), None);
    }
}
