use thiserror::Error;

/// Validation errors for the signage domain model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("content duration must be {min}..={max} seconds, got {actual}")]
    InvalidDuration { actual: u32, min: u32, max: u32 },

    #[error("invalid time of day '{0}', expected zero-padded HH:MM")]
    InvalidTimeOfDay(String),

    #[error("schedule window must start before it ends ({start} >= {end}); overnight windows are not supported")]
    InvalidTimeRange { start: String, end: String },

    #[error("active schedule must select at least one weekday")]
    EmptyWeekdaySet,

    #[error("invalid weekday {0}, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),

    #[error("content {0} is already present in the playlist")]
    DuplicatePlaylistEntry(String),

    #[error("position {index} out of range for playlist of {len} items")]
    PositionOutOfRange { index: usize, len: usize },
}
