//! Repository contracts shared by every backend implementation.

use chrono::Weekday;
use pmocontent::{ContentId, ContentItem, Schedule, Screen, ScreenId, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::error::Result;

/// One slot of a joined playlist, as the schedule query returns it.
///
/// `content` is `None` when the referenced content row no longer exists
/// (the reference dangles) or could not be decoded; the resolver drops
/// such slots instead of failing the whole playlist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSlot {
    pub position: u32,
    pub content: Option<ContentItem>,
}

/// A schedule joined with the playlist it plays.
///
/// This is the unit [`ScheduleRepository::find_active_for_screen`] returns:
/// everything the resolver needs to turn a matching schedule into a
/// playable sequence without a second round-trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub schedule: Schedule,
    pub playlist_name: String,
    pub items: Vec<PlaylistSlot>,
}

impl ScheduleEntry {
    /// The playable content of this entry: slots ordered by position,
    /// dangling references dropped.
    pub fn ordered_content(&self) -> Vec<ContentItem> {
        let mut slots: Vec<&PlaylistSlot> = self.items.iter().collect();
        slots.sort_by_key(|slot| slot.position);
        slots
            .into_iter()
            .filter_map(|slot| slot.content.clone())
            .collect()
    }
}

/// Read access to content items.
#[async_trait::async_trait]
pub trait ContentRepository: Debug + Send + Sync {
    /// All active content, newest first (`created_at` descending).
    async fn list_active(&self) -> Result<Vec<ContentItem>>;

    /// One item by id, active or not. `Ok(None)` when the id is unknown.
    async fn get_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>>;
}

/// Read access to schedules.
#[async_trait::async_trait]
pub trait ScheduleRepository: Debug + Send + Sync {
    /// Active schedules bound to `screen` whose window covers `time` on
    /// `day`, joined with their playlist, oldest first (`created_at`
    /// ascending, so the earliest-created schedule wins ties
    /// deterministically).
    async fn find_active_for_screen(
        &self,
        screen: &ScreenId,
        day: Weekday,
        time: TimeOfDay,
    ) -> Result<Vec<ScheduleEntry>>;
}

/// Read access to registered screens.
#[async_trait::async_trait]
pub trait ScreenRepository: Debug + Send + Sync {
    /// All screens, name ascending.
    async fn list_screens(&self) -> Result<Vec<Screen>>;

    /// One screen by id. `Ok(None)` when the id is unknown.
    async fn get_screen(&self, id: &ScreenId) -> Result<Option<Screen>>;
}

/// Signs blob-store paths into fetchable URLs.
#[async_trait::async_trait]
pub trait SignedUrlProvider: Debug + Send + Sync {
    /// A URL for `storage_path` that stays valid for `expires_secs` seconds.
    async fn signed_url(&self, storage_path: &str, expires_secs: u32) -> Result<String>;
}

/// Everything the display engine needs from one backend.
pub trait SignageBackend:
    ContentRepository + ScheduleRepository + ScreenRepository + SignedUrlProvider
{
}

impl<T> SignageBackend for T where
    T: ContentRepository + ScheduleRepository + ScreenRepository + SignedUrlProvider
{
}
