//! Timestamp utilities for table freshness

use crate::{Error, Result};
use chrono::{DateTime, Utc};

/// Parse an HTTP `Last-Modified` value (`Tue, 03 Oct 2023 12:00:00 GMT`)
pub fn parse_last_modified(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| Error::Config(format!("Invalid Last-Modified value {:?}: {}", value, e)))
}

/// Format a timestamp back into the HTTP `Last-Modified` form
pub fn format_last_modified(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// True when the server copy is strictly newer than the cached one.
/// A missing cached timestamp always counts as newer.
pub fn is_newer(server: &DateTime<Utc>, cached: Option<&DateTime<Utc>>) -> bool {
    match cached {
        None => true,
        Some(cached) => server > cached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_last_modified_gmt() {
        let parsed = parse_last_modified("Tue, 03 Oct 2023 12:34:56 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 10, 3, 12, 34, 56).unwrap());
    }

    #[test]
    fn test_parse_last_modified_rejects_garbage() {
        assert!(parse_last_modified("yesterday-ish").is_err());
    }

    #[test]
    fn test_format_round_trips_through_parse() {
        let stamp = Utc.with_ymd_and_hms(2024, 2, 29, 1, 2, 3).unwrap();
        let text = format_last_modified(&stamp);
        assert_eq!(text, "Thu, 29 Feb 2024 01:02:03 GMT");
        assert_eq!(parse_last_modified(&text).unwrap(), stamp);
    }

    #[test]
    fn test_is_newer() {
        let older = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();

        assert!(is_newer(&newer, None));
        assert!(is_newer(&newer, Some(&older)));
        assert!(!is_newer(&older, Some(&newer)));
        // Equal timestamps are not a change
        assert!(!is_newer(&older, Some(&older)));
    }
}
