//! Timestamp helpers shared by the storage formats and the command line.
//!
//! All timestamps are UTC. Stored lines and undo records use the compact
//! 16-character ISO form `YYYYMMDDTHHMMSSZ`; user input additionally accepts
//! the extended forms.

use crate::libs::error::{AppError, AppResult};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

pub type Datetime = DateTime<Utc>;

/// Compact ISO format used on disk.
pub const ISO_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Length of a serialized [`ISO_FORMAT`] timestamp.
pub const ISO_LENGTH: usize = 16;

const INPUT_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

pub fn to_iso(value: &Datetime) -> String {
    value.format(ISO_FORMAT).to_string()
}

pub fn from_iso(value: &str) -> AppResult<Datetime> {
    if value.len() != ISO_LENGTH {
        return Err(AppError::parse(value, "timestamp must be 16 characters"));
    }
    NaiveDateTime::parse_from_str(value, ISO_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| AppError::parse(value, e.to_string()))
}

/// Parses a timestamp typed by the user.
pub fn parse_input(value: &str) -> AppResult<Datetime> {
    if value.len() == ISO_LENGTH && value.ends_with('Z') {
        return from_iso(value);
    }
    for format in INPUT_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(at(date, NaiveTime::MIN));
    }
    Err(AppError::validation(format!("'{}' is not a valid date", value)))
}

pub fn at(date: NaiveDate, time: NaiveTime) -> Datetime {
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Midnight on the first day of the month containing `value`.
pub fn month_start(value: &Datetime) -> Datetime {
    let first = NaiveDate::from_ymd_opt(value.year(), value.month(), 1).unwrap_or(value.date_naive());
    at(first, NaiveTime::MIN)
}

/// Midnight on the first day of the month after the one containing `value`.
pub fn next_month_start(value: &Datetime) -> Datetime {
    let (year, month) = if value.month() == 12 {
        (value.year() + 1, 1)
    } else {
        (value.year(), value.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(value.date_naive());
    at(first, NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_round_trip() {
        let value = parse_input("2020-06-01T01:02:03").unwrap();
        assert_eq!(to_iso(&value), "20200601T010203Z");
        assert_eq!(from_iso("20200601T010203Z").unwrap(), value);
    }

    #[test]
    fn rejects_short_iso() {
        assert!(from_iso("20200601T0102Z").is_err());
    }

    #[test]
    fn month_boundaries() {
        let value = parse_input("2016-12-20T10:00").unwrap();
        assert_eq!(month_start(&value), parse_input("2016-12-01").unwrap());
        assert_eq!(next_month_start(&value), parse_input("2017-01-01").unwrap());
    }
}
