//! Playlists: named, ordered collections of content references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::ContentId;
use crate::error::ModelError;

/// Opaque playlist identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One slot of a playlist: a content reference and its play position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub content_id: ContentId,
    /// Dense, zero-based position, unique within the playlist.
    pub position: u32,
}

/// An ordered collection of content references.
///
/// Positions are kept dense (`0..n`) through every mutation; external data
/// with gaps or duplicates can be repaired with [`Playlist::normalize_positions`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, content_id: &ContentId) -> bool {
        self.items.iter().any(|item| &item.content_id == content_id)
    }

    /// Items sorted by ascending position (the play order).
    pub fn ordered_items(&self) -> Vec<&PlaylistItem> {
        let mut items: Vec<&PlaylistItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.position);
        items
    }

    /// Content ids in play order.
    pub fn ordered_content_ids(&self) -> Vec<&ContentId> {
        self.ordered_items()
            .into_iter()
            .map(|item| &item.content_id)
            .collect()
    }

    /// Appends a content reference at the end of the playlist.
    pub fn push_item(&mut self, content_id: ContentId) -> crate::Result<()> {
        let len = self.items.len();
        self.insert_item(len, content_id)
    }

    /// Inserts a content reference at `at` (0 = first), shifting later items.
    ///
    /// Duplicate references are rejected: a playlist holds at most one slot
    /// per content item, and the engine's media map is keyed by content id.
    pub fn insert_item(&mut self, at: usize, content_id: ContentId) -> crate::Result<()> {
        if at > self.items.len() {
            return Err(ModelError::PositionOutOfRange {
                index: at,
                len: self.items.len(),
            });
        }
        if self.contains(&content_id) {
            return Err(ModelError::DuplicatePlaylistEntry(content_id.0));
        }
        self.sort_in_place();
        self.items.insert(
            at,
            PlaylistItem {
                content_id,
                position: 0, // rewritten below
            },
        );
        self.renumber();
        Ok(())
    }

    /// Removes a content reference; returns whether anything was removed.
    /// Remaining positions are re-normalized to `0..n`.
    pub fn remove_item(&mut self, content_id: &ContentId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.content_id != content_id);
        if self.items.len() == before {
            return false;
        }
        self.normalize_positions();
        true
    }

    /// Moves the item currently at position `from` to position `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> crate::Result<()> {
        let len = self.items.len();
        if from >= len {
            return Err(ModelError::PositionOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(ModelError::PositionOutOfRange { index: to, len });
        }
        self.sort_in_place();
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.renumber();
        Ok(())
    }

    /// Repairs gaps and duplicates in position numbering while keeping the
    /// current relative order. Idempotent.
    pub fn normalize_positions(&mut self) {
        self.sort_in_place();
        self.renumber();
    }

    fn sort_in_place(&mut self) {
        // Stable: equal positions keep their incoming order.
        self.items.sort_by_key(|item| item.position);
    }

    fn renumber(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.position = index as u32;
        }
    }
}
