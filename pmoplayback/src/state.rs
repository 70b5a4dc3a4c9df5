//! The pure playback state machine.

use pmocontent::ContentItem;
use serde::{Deserialize, Serialize};

use crate::error::{PlaybackError, Result};

/// The three modes a player can be in.
///
/// `Idle` is not a stored flag: it is what an empty sequence looks like
/// from the outside. Loading content always leaves `Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Sequence, cursor, mode. No clock, no I/O: time only enters through the
/// engine that drives this.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerState {
    sequence: Vec<ContentItem>,
    current_index: usize,
    playing: bool,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the sequence. The cursor returns to the first item and a
    /// non-empty sequence starts playing immediately.
    pub fn load(&mut self, items: Vec<ContentItem>) {
        self.playing = !items.is_empty();
        self.sequence = items;
        self.current_index = 0;
    }

    /// Timer-driven step to the next item, wrapping at the end.
    /// No-op on an empty sequence; returns whether the cursor moved.
    pub fn advance(&mut self) -> bool {
        self.step_forward()
    }

    /// Manual step forward. Wraps, keeps the play/pause mode, returns
    /// whether the cursor moved.
    pub fn next(&mut self) -> bool {
        self.step_forward()
    }

    /// Manual step backward. Wraps from the first item to the last, keeps
    /// the play/pause mode, returns whether the cursor moved.
    pub fn previous(&mut self) -> bool {
        if self.sequence.is_empty() {
            return false;
        }
        self.current_index = (self.current_index + self.sequence.len() - 1) % self.sequence.len();
        true
    }

    fn step_forward(&mut self) -> bool {
        if self.sequence.is_empty() {
            return false;
        }
        self.current_index = (self.current_index + 1) % self.sequence.len();
        true
    }

    /// Flips playing/paused. No-op while idle; returns whether the mode
    /// changed.
    pub fn toggle(&mut self) -> bool {
        if self.sequence.is_empty() {
            return false;
        }
        self.playing = !self.playing;
        true
    }

    /// Moves the cursor to `index`. Out-of-range targets are rejected and
    /// leave the state untouched.
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        if index >= self.sequence.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index,
                len: self.sequence.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    pub fn current(&self) -> Option<&ContentItem> {
        self.sequence.get(self.current_index)
    }

    pub fn state(&self) -> PlaybackState {
        if self.sequence.is_empty() {
            PlaybackState::Idle
        } else if self.playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn sequence(&self) -> &[ContentItem] {
        &self.sequence
    }
}
