//! In-memory backend for tests and the offline demo mode.

use chrono::Weekday;
use pmocontent::{ContentId, ContentItem, Playlist, Schedule, Screen, ScreenId, TimeOfDay};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{BackendError, Result};
use crate::traits::{
    ContentRepository, PlaylistSlot, ScheduleEntry, ScheduleRepository, ScreenRepository,
    SignedUrlProvider,
};

/// Backend holding everything in process memory.
///
/// Semantics mirror [`RestBackend`](crate::RestBackend) exactly — same
/// orderings, same join behavior for dangling references — so the resolver
/// tests written against this type hold for the hosted backend too.
/// Storage paths resolve to `memory://{path}` URLs unless registered as
/// failing with [`MemoryBackend::fail_storage_path`].
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    content: Vec<ContentItem>,
    playlists: Vec<Playlist>,
    schedules: Vec<Schedule>,
    screens: Vec<Screen>,
    failing_paths: HashSet<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_content(&self, item: ContentItem) {
        self.inner.write().await.content.push(item);
    }

    pub async fn add_playlist(&self, playlist: Playlist) {
        self.inner.write().await.playlists.push(playlist);
    }

    pub async fn add_schedule(&self, schedule: Schedule) {
        self.inner.write().await.schedules.push(schedule);
    }

    pub async fn add_screen(&self, screen: Screen) {
        self.inner.write().await.screens.push(screen);
    }

    /// Registers a storage path whose signing will fail from now on.
    pub async fn fail_storage_path(&self, path: impl Into<String>) {
        self.inner.write().await.failing_paths.insert(path.into());
    }

    /// Drops all stored rows, keeping registered failures.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.content.clear();
        inner.playlists.clear();
        inner.schedules.clear();
        inner.screens.clear();
    }
}

#[async_trait::async_trait]
impl ContentRepository for MemoryBackend {
    async fn list_active(&self) -> Result<Vec<ContentItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<ContentItem> = inner
            .content
            .iter()
            .filter(|item| item.is_active)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get_by_id(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        let inner = self.inner.read().await;
        Ok(inner.content.iter().find(|item| &item.id == id).cloned())
    }
}

#[async_trait::async_trait]
impl ScheduleRepository for MemoryBackend {
    async fn find_active_for_screen(
        &self,
        screen: &ScreenId,
        day: Weekday,
        time: TimeOfDay,
    ) -> Result<Vec<ScheduleEntry>> {
        let inner = self.inner.read().await;

        let mut matching: Vec<&Schedule> = inner
            .schedules
            .iter()
            .filter(|s| s.is_active && s.screen_id.as_ref() == Some(screen) && s.covers(day, time))
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.0.cmp(&b.id.0)));

        let entries = matching
            .into_iter()
            .map(|schedule| {
                let playlist = inner
                    .playlists
                    .iter()
                    .find(|p| p.id == schedule.playlist_id);
                let playlist_name = playlist.map(|p| p.name.clone()).unwrap_or_default();
                let items = playlist
                    .map(|p| {
                        p.items
                            .iter()
                            .map(|slot| PlaylistSlot {
                                position: slot.position,
                                content: inner
                                    .content
                                    .iter()
                                    .find(|c| c.id == slot.content_id)
                                    .cloned(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ScheduleEntry {
                    schedule: schedule.clone(),
                    playlist_name,
                    items,
                }
            })
            .collect();

        Ok(entries)
    }
}

#[async_trait::async_trait]
impl ScreenRepository for MemoryBackend {
    async fn list_screens(&self) -> Result<Vec<Screen>> {
        let inner = self.inner.read().await;
        let mut screens = inner.screens.clone();
        screens.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(screens)
    }

    async fn get_screen(&self, id: &ScreenId) -> Result<Option<Screen>> {
        let inner = self.inner.read().await;
        Ok(inner.screens.iter().find(|s| &s.id == id).cloned())
    }
}

#[async_trait::async_trait]
impl SignedUrlProvider for MemoryBackend {
    async fn signed_url(&self, storage_path: &str, _expires_secs: u32) -> Result<String> {
        let inner = self.inner.read().await;
        if inner.failing_paths.contains(storage_path) {
            return Err(BackendError::storage(format!(
                "signing {storage_path} refused"
            )));
        }
        Ok(format!("memory://{storage_path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pmocontent::{ContentPayload, PlaylistId, PlaylistItem, ScheduleId, TextSlide, WeekdaySet};

    fn item(id: &str, active: bool, created_min: u32) -> ContentItem {
        ContentItem {
            id: ContentId::from(id),
            title: id.to_string(),
            payload: ContentPayload::Text(TextSlide::new(id)),
            duration_secs: 10,
            is_active: active,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, created_min, 0).unwrap(),
        }
    }

    fn playlist(id: &str, content_ids: &[&str]) -> Playlist {
        Playlist {
            id: PlaylistId::from(id),
            name: format!("Playlist {id}"),
            description: String::new(),
            is_active: true,
            items: content_ids
                .iter()
                .enumerate()
                .map(|(position, cid)| PlaylistItem {
                    content_id: ContentId::from(*cid),
                    position: position as u32,
                })
                .collect(),
            created_at: DateTime::UNIX_EPOCH,
        }
    }

    fn schedule(id: &str, playlist: &str, screen: &str, created_min: u32) -> Schedule {
        Schedule {
            id: ScheduleId::from(id),
            name: id.to_string(),
            playlist_id: PlaylistId::from(playlist),
            screen_id: Some(ScreenId::from(screen)),
            start_time: "09:00".parse().unwrap(),
            end_time: "17:00".parse().unwrap(),
            days_of_week: WeekdaySet::from_days(&[1, 2, 3, 4, 5]).unwrap(),
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, created_min, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn list_active_is_newest_first_and_filtered() {
        let backend = MemoryBackend::new();
        backend.add_content(item("old", true, 0)).await;
        backend.add_content(item("inactive", false, 10)).await;
        backend.add_content(item("new", true, 20)).await;

        let ids: Vec<String> = backend
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id.0)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn get_by_id_ignores_active_flag() {
        let backend = MemoryBackend::new();
        backend.add_content(item("hidden", false, 0)).await;

        let found = backend.get_by_id(&ContentId::from("hidden")).await.unwrap();
        assert!(found.is_some());
        let missing = backend.get_by_id(&ContentId::from("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn schedules_filter_by_screen_window_and_day() {
        let backend = MemoryBackend::new();
        backend.add_content(item("a", true, 0)).await;
        backend.add_playlist(playlist("p1", &["a"])).await;
        backend.add_schedule(schedule("s1", "p1", "lobby", 0)).await;
        backend.add_schedule(schedule("other", "p1", "hall", 0)).await;

        let wed_noon = backend
            .find_active_for_screen(&ScreenId::from("lobby"), Weekday::Wed, "12:00".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(wed_noon.len(), 1);
        assert_eq!(wed_noon[0].schedule.id.as_str(), "s1");
        assert_eq!(wed_noon[0].playlist_name, "Playlist p1");

        let sunday = backend
            .find_active_for_screen(&ScreenId::from("lobby"), Weekday::Sun, "12:00".parse().unwrap())
            .await
            .unwrap();
        assert!(sunday.is_empty());

        let after_hours = backend
            .find_active_for_screen(&ScreenId::from("lobby"), Weekday::Wed, "17:01".parse().unwrap())
            .await
            .unwrap();
        assert!(after_hours.is_empty());
    }

    #[tokio::test]
    async fn overlapping_schedules_come_back_earliest_created_first() {
        let backend = MemoryBackend::new();
        backend.add_playlist(playlist("p1", &[])).await;
        backend.add_schedule(schedule("later", "p1", "lobby", 30)).await;
        backend.add_schedule(schedule("earlier", "p1", "lobby", 10)).await;

        let entries = backend
            .find_active_for_screen(&ScreenId::from("lobby"), Weekday::Mon, "10:00".parse().unwrap())
            .await
            .unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.schedule.id.as_str()).collect();
        assert_eq!(ids, vec!["earlier", "later"]);
    }

    #[tokio::test]
    async fn dangling_playlist_reference_joins_as_empty_slot() {
        let backend = MemoryBackend::new();
        backend.add_content(item("kept", true, 0)).await;
        backend.add_playlist(playlist("p1", &["kept", "deleted"])).await;
        backend.add_schedule(schedule("s1", "p1", "lobby", 0)).await;

        let entries = backend
            .find_active_for_screen(&ScreenId::from("lobby"), Weekday::Mon, "10:00".parse().unwrap())
            .await
            .unwrap();
        let slots = &entries[0].items;
        assert_eq!(slots.len(), 2);
        assert!(slots[0].content.is_some());
        assert!(slots[1].content.is_none());
        assert_eq!(
            entries[0]
                .ordered_content()
                .iter()
                .map(|i| i.id.as_str())
                .collect::<Vec<_>>(),
            vec!["kept"]
        );
    }

    #[tokio::test]
    async fn signing_fails_only_for_registered_paths() {
        let backend = MemoryBackend::new();
        backend.fail_storage_path("content/u1/broken.jpg").await;

        let ok = backend.signed_url("content/u1/fine.jpg", 3600).await.unwrap();
        assert_eq!(ok, "memory://content/u1/fine.jpg");

        let err = backend.signed_url("content/u1/broken.jpg", 3600).await;
        assert!(matches!(err, Err(BackendError::Storage(_))));
    }

    #[tokio::test]
    async fn screens_list_sorted_by_name() {
        let backend = MemoryBackend::new();
        let mk = |id: &str, name: &str| Screen {
            id: ScreenId::from(id),
            name: name.to_string(),
            location: None,
            resolution: None,
            status: Default::default(),
            last_seen_at: None,
            created_at: DateTime::UNIX_EPOCH,
        };
        backend.add_screen(mk("2", "Zulu")).await;
        backend.add_screen(mk("1", "Alpha")).await;

        let names: Vec<String> = backend
            .list_screens()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Zulu"]);
    }
}
