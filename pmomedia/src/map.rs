//! Accumulated resolution results.

use pmocontent::{ContentId, ContentItem};
use std::collections::{HashMap, HashSet};

/// Rendering state of one item's media element, derived from a [`MediaMap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaState {
    /// Text and markup slides carry no media element.
    NotMedia,
    /// No outcome yet; render a placeholder.
    Loading,
    /// Fetchable at this URL.
    Ready(String),
    /// Could not be resolved, or the display surface could not load it.
    Failed,
}

/// Resolution outcomes for a sequence, keyed by content id.
///
/// The binder only ever merges into this map, so tasks completing out of
/// order cannot lose each other's entries. An id appears in at most one of
/// the two sets; everything else is still loading.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaMap {
    pub resolved: HashMap<ContentId, String>,
    pub failed: HashSet<ContentId>,
}

impl MediaMap {
    /// What the display surface should do with `item` right now.
    pub fn state_for(&self, item: &ContentItem) -> MediaState {
        if !item.is_media() {
            return MediaState::NotMedia;
        }
        if let Some(url) = self.resolved.get(&item.id) {
            return MediaState::Ready(url.clone());
        }
        if self.failed.contains(&item.id) {
            return MediaState::Failed;
        }
        MediaState::Loading
    }

    /// Whether `id` already has an outcome, positive or negative.
    pub fn settled(&self, id: &ContentId) -> bool {
        self.resolved.contains_key(id) || self.failed.contains(id)
    }
}
