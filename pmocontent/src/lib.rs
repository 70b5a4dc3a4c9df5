//! # PMOContent
//!
//! Domain model shared by the PMOSign display engine crates.
//!
//! This crate defines the four persistent entities of the signage system and
//! the value types they are built from:
//!
//! - [`ContentItem`] — an atomic unit of displayable material (text, image,
//!   video or markup slide) with a per-item duration,
//! - [`Playlist`] — an ordered collection of content references with dense,
//!   zero-based positions,
//! - [`Schedule`] — a time-and-weekday window binding a playlist to a screen,
//! - [`Screen`] — an addressable display target.
//!
//! Everything here is plain data: no I/O, no clocks, no async. Repository
//! access lives in `pmobackend`, resolution logic in `pmoschedule`.
//!
//! ## Invariants
//!
//! - A content item's payload shape always matches its kind — enforced by
//!   construction, the payload *is* the kind ([`ContentPayload`]).
//! - Durations are bounded to 1..=300 seconds ([`ContentItem::validate`]).
//! - Playlist positions stay dense (`0..n`) across every mutation.
//! - Schedules never span midnight (`start_time < end_time`), and an active
//!   schedule selects at least one weekday.

mod content;
mod error;
mod playlist;
mod schedule;
mod screen;

pub use content::{
    ContentId, ContentItem, ContentKind, ContentPayload, MediaSource, TextSlide,
    DEFAULT_TEXT_ALIGN, DEFAULT_TEXT_BACKGROUND, DEFAULT_TEXT_COLOR, DEFAULT_TEXT_FONT_SIZE,
    MAX_DURATION_SECS, MIN_DURATION_SECS,
};
pub use error::ModelError;
pub use playlist::{Playlist, PlaylistId, PlaylistItem};
pub use schedule::{Schedule, ScheduleId, TimeOfDay, WeekdaySet};
pub use screen::{Screen, ScreenId, ScreenRef, ScreenStatus, GENERIC_SCREEN};

/// Result type for model validation operations.
pub type Result<T> = std::result::Result<T, ModelError>;
