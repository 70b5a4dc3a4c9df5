//! Error types for playback control.

/// Result type alias for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Errors that can occur when controlling playback.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// The engine task is gone (shut down or crashed); commands can no
    /// longer be delivered.
    #[error("playback engine is closed")]
    EngineClosed,

    /// A jump target outside the loaded sequence.
    #[error("index {index} out of range for a sequence of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}
