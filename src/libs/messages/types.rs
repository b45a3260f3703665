#[derive(Debug, Clone)]
pub enum Message {
    // === TRACKING MESSAGES ===
    TrackingStarted { tags: String, start: String },
    TrackingStopped { tags: String, start: String, end: String, total: String },
    TrackingNothing,
    IntervalRecorded { tags: String, start: String, end: String },
    IntervalOverlaps(usize),
    EndBeforeStart,

    // === INTERVAL MESSAGES ===
    NoIdsProvided,
    NoTagsProvided,
    IdNotFound(usize),
    IntervalsDeleted(usize),
    IntervalsTagged { count: usize, tags: String },
    IntervalsUntagged { count: usize, tags: String },
    IntervalsAnnotated(usize),
    NoIntervalsFound,
    ConfirmDeleteIntervals(usize),
    OperationCancelled,

    // === TAG MESSAGES ===
    NewTag(String),
    NoTags,

    // === UNDO MESSAGES ===
    NothingToUndo,
    UndoApplied(usize),
    UndoDisabled,

    // === CONFIG MESSAGES ===
    ConfigSet { name: String, value: String },
    ConfigUnset(String),
    ConfigUnchanged(String),
    ConfigNotSet(String),
    ConfigValue { name: String, value: String },

    // === INPUT MESSAGES ===
    InvalidDate(String),
}
