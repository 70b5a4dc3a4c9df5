//! # PMOPlayback
//!
//! The playback state machine driving one display.
//!
//! Two layers, so the transition rules stay exhaustively testable without
//! a runtime:
//!
//! - [`PlayerState`] — the pure machine: a sequence, a cursor, a
//!   playing/paused flag. Every transition (load, advance, toggle, manual
//!   navigation, jump) is a synchronous method with no I/O and no clock.
//! - [`PlaybackEngine`] — the tokio driver: one spawned task owns a
//!   `PlayerState`, receives commands over an mpsc channel, publishes
//!   [`PlaybackStatus`] snapshots on a watch channel, and holds the single
//!   armed deadline that advances the sequence when an item's display time
//!   is up.
//!
//! The engine performs no I/O either: it is handed fully resolved
//! sequences and emits status. Feeding it (schedule resolution) and
//! consuming it (media binding, the display API) live in `pmoschedule`,
//! `pmomedia` and `pmodisplay`.

mod engine;
mod error;
mod state;

pub use engine::{PlaybackEngine, PlaybackStatus};
pub use error::{PlaybackError, Result};
pub use state::{PlaybackState, PlayerState};
