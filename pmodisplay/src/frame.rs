//! The frame: one self-contained snapshot of what a display should show.

use chrono::{DateTime, Utc};
use pmocontent::{ContentId, ContentItem, ContentKind};
use pmomedia::{MediaMap, MediaState};
use pmoplayback::{PlaybackState, PlaybackStatus};
use pmoschedule::SequenceSource;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::session::SessionId;

/// Media availability of a slide, as the display surface sees it.
///
/// Serialized form of [`pmomedia::MediaState`]: the surface renders a
/// loading placeholder until `ready`, and a stable "unavailable" state for
/// `failed` — it must not retry a failed source on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlideMedia {
    /// Text and markup slides carry no media element.
    None,
    Loading,
    Ready { url: String },
    Failed,
}

impl From<MediaState> for SlideMedia {
    fn from(state: MediaState) -> Self {
        match state {
            MediaState::NotMedia => Self::None,
            MediaState::Loading => Self::Loading,
            MediaState::Ready(url) => Self::Ready { url },
            MediaState::Failed => Self::Failed,
        }
    }
}

/// One entry of the sequence overview, enough for a progress-dot strip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SlideSummary {
    #[schema(value_type = String)]
    pub content_id: ContentId,
    pub title: String,
    #[schema(value_type = String)]
    pub kind: ContentKind,
    pub duration_secs: u32,
}

impl From<&ContentItem> for SlideSummary {
    fn from(item: &ContentItem) -> Self {
        Self {
            content_id: item.id.clone(),
            title: item.title.clone(),
            kind: item.kind(),
            duration_secs: item.duration_secs,
        }
    }
}

/// The slide currently on air.
///
/// `item` carries the full payload, including raw markup HTML: the surface
/// must render markup inside a sandboxed iframe-equivalent, never into the
/// host page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentSlide {
    #[schema(value_type = Object)]
    pub item: ContentItem,
    pub media: SlideMedia,
    #[schema(value_type = String, format = DateTime)]
    pub entered_at: DateTime<Utc>,
    pub duration_secs: u32,
}

/// Everything the display surface needs to render one moment of a session.
///
/// A new frame is published on every state change — playback advancing, a
/// media URL landing, a refresh swapping the sequence — so the surface can
/// be a pure function of the latest frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DisplayFrame {
    pub session_id: SessionId,
    /// Which tier of the resolution chain produced the playing sequence.
    #[schema(value_type = Object)]
    pub source: SequenceSource,
    #[schema(value_type = String)]
    pub state: PlaybackState,
    pub current_index: usize,
    pub sequence_len: usize,
    pub current: Option<CurrentSlide>,
    pub overview: Vec<SlideSummary>,
    /// True only when nothing at all is loaded; the surface shows its
    /// "no content" screen instead of erroring.
    pub no_content: bool,
}

impl DisplayFrame {
    pub(crate) fn compose(
        session_id: &SessionId,
        status: &PlaybackStatus,
        media: &MediaMap,
        source: &SequenceSource,
        items: &[ContentItem],
    ) -> Self {
        let current = status.current.as_ref().map(|item| CurrentSlide {
            media: media.state_for(item).into(),
            entered_at: status.entered_at,
            duration_secs: item.duration_secs,
            item: item.clone(),
        });
        Self {
            session_id: session_id.clone(),
            source: source.clone(),
            state: status.state,
            current_index: status.current_index,
            sequence_len: status.sequence_len,
            current,
            overview: items.iter().map(SlideSummary::from).collect(),
            no_content: status.sequence_len == 0,
        }
    }
}
