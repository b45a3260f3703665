//! Text rendering for values shown in tables and messages.
//!
//! Every command that prints intervals goes through these helpers so that
//! durations, timestamps and tag lists look the same everywhere.
//!
//! ## Formats
//!
//! - **Durations**: `H:MM:SS`, hours unbounded, negative values shown as zero
//! - **Timestamps**: local `YYYY-MM-DDTHH:MM:SS`
//! - **Missing values**: a single `-`
//! - **Tags**: space separated, quoted the same way the datafiles quote them
//!
//! ```rust
//! use chrono::Duration;
//! use tempo::libs::formatter::format_duration;
//!
//! assert_eq!(format_duration(&Duration::minutes(90)), "1:30:00");
//! ```

use crate::libs::datetime::Datetime;
use crate::libs::interval::quote_if_needed;
use chrono::Duration;
use std::collections::BTreeSet;

/// `H:MM:SS`, clamped at zero.
pub fn format_duration(duration: &Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    format!("{}:{:02}:{:02}", seconds / 3600, (seconds / 60) % 60, seconds % 60)
}

/// Second precision, without a zone suffix.
pub fn format_datetime(value: &Datetime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Like [`format_datetime`], with `-` standing in for a missing bound.
pub fn format_optional(value: Option<Datetime>) -> String {
    value.as_ref().map(format_datetime).unwrap_or_else(|| "-".to_string())
}

/// Tags as typed on the command line, or `-` when there are none.
pub fn format_tags(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter().map(|tag| quote_if_needed(tag)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(&Duration::seconds(3725)), "1:02:05");
        assert_eq!(format_duration(&Duration::hours(27)), "27:00:00");
        assert_eq!(format_duration(&Duration::seconds(-5)), "0:00:00");
    }

    #[test]
    fn tags_are_quoted_when_needed() {
        let tags: BTreeSet<String> = ["deep work".to_string(), "client".to_string()].into_iter().collect();
        assert_eq!(format_tags(&tags), "\"deep work\" client");
        assert_eq!(format_tags(&BTreeSet::new()), "-");
    }
}
