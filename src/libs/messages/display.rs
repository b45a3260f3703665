//! User-facing text for every [`Message`].
//!
//! All wording lives here so commands only pick a variant and fill in its
//! fields.

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            // === TRACKING MESSAGES ===
            Message::TrackingStarted { tags, start } => format!("Tracking {}\n  Started {}", tags, start),
            Message::TrackingStopped { tags, start, end, total } => {
                format!("Recorded {}\n  Started {}\n  Ended   {}\n  Total   {}", tags, start, end, total)
            }
            Message::TrackingNothing => "There is no active time tracking.".to_string(),
            Message::IntervalRecorded { tags, start, end } => format!("Recorded {} from {} to {}", tags, start, end),
            Message::IntervalOverlaps(count) => {
                format!("The interval overlaps {} tracked interval(s). Correct the start or end time.", count)
            }
            Message::EndBeforeStart => "The end of an interval must be after its start.".to_string(),

            // === INTERVAL MESSAGES ===
            Message::NoIdsProvided => "IDs must be specified. See 'tempo list'.".to_string(),
            Message::NoTagsProvided => "At least one tag must be specified.".to_string(),
            Message::IdNotFound(id) => format!("ID '@{}' does not correspond to any tracking.", id),
            Message::IntervalsDeleted(count) => format!("Deleted {} interval(s).", count),
            Message::IntervalsTagged { count, tags } => format!("Added {} to {} interval(s).", tags, count),
            Message::IntervalsUntagged { count, tags } => format!("Removed {} from {} interval(s).", tags, count),
            Message::IntervalsAnnotated(count) => format!("Annotated {} interval(s).", count),
            Message::NoIntervalsFound => "No filtered data found.".to_string(),
            Message::ConfirmDeleteIntervals(count) => format!("Delete {} interval(s)?", count),
            Message::OperationCancelled => "Operation cancelled.".to_string(),

            // === TAG MESSAGES ===
            Message::NewTag(tag) => format!("Note: '{}' is a new tag.", tag),
            Message::NoTags => "No tags have been used yet.".to_string(),

            // === UNDO MESSAGES ===
            Message::NothingToUndo => "Nothing to undo.".to_string(),
            Message::UndoApplied(count) => format!("Undone {} change(s).", count),
            Message::UndoDisabled => "Undo is disabled because journal.size is 0.".to_string(),

            // === CONFIG MESSAGES ===
            Message::ConfigSet { name, value } => format!("Config setting '{}' set to '{}'.", name, value),
            Message::ConfigUnset(name) => format!("Config setting '{}' removed.", name),
            Message::ConfigUnchanged(name) => format!("Config setting '{}' is unchanged.", name),
            Message::ConfigNotSet(name) => format!("Config setting '{}' is not set.", name),
            Message::ConfigValue { name, value } => format!("{} = {}", name, value),

            // === INPUT MESSAGES ===
            Message::InvalidDate(value) => format!("'{}' is not a valid date.", value),
        };
        write!(f, "{}", text)
    }
}
