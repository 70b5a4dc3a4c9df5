//! The resolution chain itself.

use chrono::{DateTime, Datelike, Local, Utc};
use pmobackend::{ContentRepository, ScheduleRepository};
use pmocontent::{ContentId, ContentItem, ScheduleId, ScreenRef, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::demo::demo_sequence;

/// What a display asked to play, as read from its URL parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveRequest {
    pub screen: ScreenRef,
    /// Content id to show alone, bypassing every schedule rule.
    pub preview: Option<ContentId>,
}

impl ResolveRequest {
    pub fn for_screen(screen: ScreenRef) -> Self {
        Self {
            screen,
            preview: None,
        }
    }

    pub fn for_preview(content_id: ContentId) -> Self {
        Self {
            screen: ScreenRef::Unspecified,
            preview: Some(content_id),
        }
    }

    /// Builds a request from raw `?screen=` / `?preview=` query values.
    pub fn from_params(screen: Option<&str>, preview: Option<&str>) -> Self {
        Self {
            screen: ScreenRef::parse(screen),
            preview: preview
                .filter(|p| !p.is_empty())
                .map(ContentId::from),
        }
    }
}

/// Which tier of the chain produced a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SequenceSource {
    /// Single-item preview override.
    Preview { content_id: ContentId },
    /// A matching schedule's playlist.
    Schedule {
        schedule_id: ScheduleId,
        schedule_name: String,
        playlist_name: String,
    },
    /// The active content pool, newest first.
    ActivePool,
    /// The built-in demo slides.
    Demo,
}

/// The outcome of one resolution: an ordered, never-empty sequence and
/// where it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSequence {
    pub items: Vec<ContentItem>,
    pub source: SequenceSource,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedSequence {
    fn new(items: Vec<ContentItem>, source: SequenceSource) -> Self {
        Self {
            items,
            source,
            resolved_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.source, SequenceSource::Demo)
    }

    /// The item ids in play order.
    pub fn ids(&self) -> Vec<&ContentId> {
        self.items.iter().map(|item| &item.id).collect()
    }
}

/// Maps (screen, now) to the sequence that should be on air.
///
/// Generic over the backend so the whole chain is testable against
/// in-memory fixtures; the binary instantiates it once with the configured
/// backend and shares it across display sessions.
#[derive(Debug)]
pub struct ScheduleResolver<B: ?Sized> {
    backend: Arc<B>,
}

impl<B: ?Sized> Clone for ScheduleResolver<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B> ScheduleResolver<B>
where
    B: ContentRepository + ScheduleRepository + ?Sized,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Resolves what `request` should play at local time `now`.
    ///
    /// Infallible by design: repository errors are logged and treated as
    /// "no match", so the worst possible outcome is the demo sequence.
    pub async fn resolve(&self, request: &ResolveRequest, now: DateTime<Local>) -> ResolvedSequence {
        if let Some(sequence) = self.try_preview(request).await {
            return sequence;
        }
        if let Some(sequence) = self.try_schedule(request, now).await {
            return sequence;
        }
        if let Some(sequence) = self.try_active_pool().await {
            return sequence;
        }
        tracing::debug!("resolution fell through to the demo sequence");
        ResolvedSequence::new(demo_sequence(), SequenceSource::Demo)
    }

    async fn try_preview(&self, request: &ResolveRequest) -> Option<ResolvedSequence> {
        let content_id = request.preview.as_ref()?;
        match self.backend.get_by_id(content_id).await {
            Ok(Some(item)) => {
                tracing::info!(content = %content_id, "previewing single content item");
                Some(ResolvedSequence::new(
                    vec![item],
                    SequenceSource::Preview {
                        content_id: content_id.clone(),
                    },
                ))
            }
            Ok(None) => {
                tracing::warn!(content = %content_id, "preview content not found, falling through");
                None
            }
            Err(err) => {
                tracing::warn!(content = %content_id, error = %err, "preview lookup failed, falling through");
                None
            }
        }
    }

    async fn try_schedule(
        &self,
        request: &ResolveRequest,
        now: DateTime<Local>,
    ) -> Option<ResolvedSequence> {
        // Only a concrete screen is ever scheduled; `generic` and absent
        // screens go straight to the pool.
        let screen_id = request.screen.screen_id()?;

        let day = now.weekday();
        let time = TimeOfDay::from_naive(now.time());
        let entries = match self
            .backend
            .find_active_for_screen(screen_id, day, time)
            .await
        {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(screen = %screen_id, error = %err, "schedule lookup failed, falling through");
                return None;
            }
        };

        // First entry wins: the repository orders by creation time, so the
        // pick is stable across calls even when windows overlap.
        let entry = entries.into_iter().next()?;
        let items = keep_valid(entry.ordered_content());
        if items.is_empty() {
            tracing::warn!(
                schedule = %entry.schedule.id,
                playlist = %entry.playlist_name,
                "matching schedule has no playable content, falling through"
            );
            return None;
        }

        tracing::info!(
            schedule = %entry.schedule.id,
            playlist = %entry.playlist_name,
            items = items.len(),
            "playing scheduled playlist"
        );
        Some(ResolvedSequence::new(
            items,
            SequenceSource::Schedule {
                schedule_id: entry.schedule.id,
                schedule_name: entry.schedule.name,
                playlist_name: entry.playlist_name,
            },
        ))
    }

    async fn try_active_pool(&self) -> Option<ResolvedSequence> {
        let items = match self.backend.list_active().await {
            Ok(items) => keep_valid(items),
            Err(err) => {
                tracing::warn!(error = %err, "active content lookup failed, falling through");
                return None;
            }
        };
        if items.is_empty() {
            return None;
        }
        tracing::info!(items = items.len(), "playing the active content pool");
        Some(ResolvedSequence::new(items, SequenceSource::ActivePool))
    }
}

/// Drops items that fail model validation, keeping order.
fn keep_valid(items: Vec<ContentItem>) -> Vec<ContentItem> {
    items
        .into_iter()
        .filter(|item| match item.validate() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(content = %item.id, error = %err, "dropping invalid content item");
                false
            }
        })
        .collect()
}
