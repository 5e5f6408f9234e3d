//! Centralized datetime handling utilities
//!
//! Connection records arrive from the management API with expiry dates in a
//! handful of shapes (full RFC3339 timestamps, SQLite-style timestamps, or a
//! bare `YYYY-MM-DD` from a date picker). Everything is normalized to UTC and
//! stored as RFC3339 text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Errors that can occur during datetime operations
#[derive(Error, Debug)]
pub enum DateTimeError {
    /// Invalid datetime format provided
    #[error("Invalid datetime format: '{input}' - expected RFC3339 (2023-01-01T12:00:00Z), SQLite (2023-01-01 12:00:00) or a date (2023-01-01)")]
    InvalidFormat { input: String },
}

/// Centralized datetime parsing and formatting utilities
pub struct DateTimeParser;

impl DateTimeParser {
    /// Parse datetime from the formats accepted by the application
    ///
    /// Supports:
    /// - RFC3339 with timezone or offset: "2023-01-01T12:00:00Z"
    /// - SQLite format (assumes UTC): "2023-01-01 12:00:00"
    /// - ISO without timezone (assumes UTC): "2023-01-01T12:00:00"
    /// - Date only (midnight UTC): "2023-01-01"
    pub fn parse_flexible(datetime_str: &str) -> Result<DateTime<Utc>, DateTimeError> {
        let trimmed = datetime_str.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive_formats = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
        ];

        for format in &naive_formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(naive_dt.and_utc());
            }
        }

        if let Some(naive_dt) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            return Ok(naive_dt.and_utc());
        }

        Err(DateTimeError::InvalidFormat {
            input: datetime_str.to_string(),
        })
    }

    /// Format datetime for storage
    pub fn format_for_storage(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Format as the `YYYY-MM-DD HH:MM:SS` wall clock Xtream clients expect
    pub fn format_xtream_time(dt: &DateTime<Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Serde helper for optional datetime fields; blank strings count as unset
///
/// Use with `#[serde(default, deserialize_with = "deserialize_optional_datetime")]`
pub fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTimeParser::parse_flexible(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let dt = DateTimeParser::parse_flexible("2023-01-01T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_with_offset_converts_to_utc() {
        let dt = DateTimeParser::parse_flexible("2023-01-01T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_sqlite_format() {
        let dt = DateTimeParser::parse_flexible("2023-01-01 12:00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only_is_midnight_utc() {
        let dt = DateTimeParser::parse_flexible("2024-02-29").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_format() {
        match DateTimeParser::parse_flexible("next tuesday") {
            Err(DateTimeError::InvalidFormat { input }) => assert_eq!(input, "next tuesday"),
            other => panic!("Expected InvalidFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_storage_format_round_trips() {
        let dt = Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap();
        let stored = DateTimeParser::format_for_storage(&dt);
        assert_eq!(stored, "2023-01-01T12:00:00.000Z");
        assert_eq!(DateTimeParser::parse_flexible(&stored).unwrap(), dt);
    }

    #[test]
    fn test_format_xtream_time() {
        let dt = Utc.with_ymd_and_hms(2023, 7, 4, 9, 5, 3).unwrap();
        assert_eq!(DateTimeParser::format_xtream_time(&dt), "2023-07-04 09:05:03");
    }
}
