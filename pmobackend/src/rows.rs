//! Wire rows of the hosted backend and their conversion into model types.
//!
//! The hosted schema is not ours to change: payload keys are camelCase
//! (`fontSize`, `storagePath` stayed snake, `fileName`, ...), times come
//! back as `"HH:MM:SS"`, markup rows are typed `"html"`. Everything
//! schema-shaped is confined to this module; the rest of the crate only
//! sees `pmocontent` types.
//!
//! Decoding is row-by-row: a malformed row is logged and dropped, it never
//! fails the query that carried it. A screen that must keep playing is
//! better served by nine good rows than by an error about the tenth.

use chrono::{DateTime, NaiveTime, Utc};
use pmocontent::{
    ContentId, ContentItem, ContentKind, ContentPayload, MediaSource, PlaylistId, Schedule,
    ScheduleId, Screen, ScreenId, ScreenStatus, TextSlide, TimeOfDay,
};
use serde::Deserialize;
use serde_json::Value;

use crate::traits::{PlaylistSlot, ScheduleEntry};

/// Why one row could not become a model value.
#[derive(Debug, thiserror::Error)]
pub(crate) enum RowError {
    #[error("unknown content kind '{0}'")]
    UnknownKind(String),

    #[error("duration {0} not representable")]
    InvalidDuration(i64),

    #[error("schedule has no playlist reference")]
    MissingPlaylist,

    #[error("bad time value '{0}'")]
    BadTime(String),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Model(#[from] pmocontent::ModelError),
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Content
// ============================================================================

/// A row of the `content` table.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentRow {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content_data: Value,
    pub duration: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TextData {
    text: String,
    #[serde(default, rename = "fontSize")]
    font_size: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, rename = "backgroundColor")]
    background_color: Option<String>,
    #[serde(default, rename = "textAlign")]
    text_align: Option<String>,
}

impl From<TextData> for TextSlide {
    fn from(data: TextData) -> Self {
        Self {
            text: data.text,
            font_size: data.font_size,
            color: data.color,
            background_color: data.background_color,
            align: data.text_align,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    storage_path: Option<String>,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default, rename = "fileName")]
    file_name: Option<String>,
    #[serde(default, rename = "fileSize")]
    file_size: Option<u64>,
    #[serde(default, rename = "mimeType")]
    mime_type: Option<String>,
}

impl From<MediaData> for MediaSource {
    fn from(data: MediaData) -> Self {
        Self {
            url: data.url,
            storage_path: data.storage_path,
            alt: data.alt.unwrap_or_default(),
            file_name: data.file_name,
            mime_type: data.mime_type,
            size_bytes: data.file_size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarkupData {
    html: String,
}

impl ContentRow {
    pub(crate) fn into_item(self) -> Result<ContentItem, RowError> {
        let kind =
            ContentKind::parse(&self.kind).ok_or_else(|| RowError::UnknownKind(self.kind.clone()))?;

        let payload = match kind {
            ContentKind::Text => {
                ContentPayload::Text(serde_json::from_value::<TextData>(self.content_data)?.into())
            }
            ContentKind::Image => {
                ContentPayload::Image(serde_json::from_value::<MediaData>(self.content_data)?.into())
            }
            ContentKind::Video => {
                ContentPayload::Video(serde_json::from_value::<MediaData>(self.content_data)?.into())
            }
            ContentKind::Markup => ContentPayload::Markup {
                html: serde_json::from_value::<MarkupData>(self.content_data)?.html,
            },
        };

        let duration_secs =
            u32::try_from(self.duration).map_err(|_| RowError::InvalidDuration(self.duration))?;

        let item = ContentItem {
            id: ContentId::new(self.id),
            title: self.title,
            payload,
            duration_secs,
            is_active: self.is_active,
            created_at: self.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        };
        item.validate()?;
        Ok(item)
    }
}

/// Decodes a page of content rows, dropping the ones that do not convert.
pub(crate) fn decode_content_rows(values: Vec<Value>) -> Vec<ContentItem> {
    values
        .into_iter()
        .filter_map(|value| match decode_content_value(value) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable content row");
                None
            }
        })
        .collect()
}

fn decode_content_value(value: Value) -> Result<ContentItem, RowError> {
    serde_json::from_value::<ContentRow>(value)?.into_item()
}

// ============================================================================
// Schedules (joined with playlist and content)
// ============================================================================

/// A row of the `schedules` table with the nested playlist select.
#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub screen_id: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub days_of_week: Vec<u8>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub playlist: Option<PlaylistJoin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistJoin {
    pub name: String,
    #[serde(default)]
    pub playlist_items: Vec<PlaylistItemRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistItemRow {
    #[serde(default)]
    pub content_id: Option<String>,
    pub order_index: i64,
    #[serde(default)]
    pub content: Option<Value>,
}

/// Postgres serializes `time` columns as `"HH:MM:SS"`; admin-entered rows
/// occasionally carry plain `"HH:MM"`. Accept both.
fn parse_pg_time(raw: &str) -> Result<TimeOfDay, RowError> {
    if let Ok(time) = raw.parse::<TimeOfDay>() {
        return Ok(time);
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .map(TimeOfDay::from_naive)
        .map_err(|_| RowError::BadTime(raw.to_string()))
}

impl ScheduleRow {
    pub(crate) fn into_entry(self) -> Result<ScheduleEntry, RowError> {
        let playlist_id = self.playlist_id.ok_or(RowError::MissingPlaylist)?;

        let schedule = Schedule {
            id: ScheduleId::new(self.id),
            name: self.name,
            playlist_id: PlaylistId::new(playlist_id),
            screen_id: self.screen_id.map(ScreenId::new),
            start_time: parse_pg_time(&self.start_time)?,
            end_time: parse_pg_time(&self.end_time)?,
            days_of_week: self.days_of_week.try_into()?,
            is_active: self.is_active,
            created_at: self.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        };
        schedule.validate()?;

        let (playlist_name, items) = match self.playlist {
            Some(join) => {
                let slots = join
                    .playlist_items
                    .into_iter()
                    .map(PlaylistItemRow::into_slot)
                    .collect();
                (join.name, slots)
            }
            None => (String::new(), Vec::new()),
        };

        Ok(ScheduleEntry {
            schedule,
            playlist_name,
            items,
        })
    }
}

impl PlaylistItemRow {
    fn into_slot(self) -> PlaylistSlot {
        let position = self.order_index.clamp(0, i64::from(u32::MAX)) as u32;
        let content = match self.content {
            Some(value) => match decode_content_value(value) {
                Ok(item) => Some(item),
                Err(err) => {
                    tracing::warn!(
                        content_id = self.content_id.as_deref().unwrap_or("?"),
                        error = %err,
                        "dropping undecodable playlist content"
                    );
                    None
                }
            },
            // The reference dangles: content row deleted after the playlist
            // was assembled. The slot stays, empty, so positions still sort.
            None => None,
        };
        PlaylistSlot { position, content }
    }
}

/// Decodes a page of schedule rows, dropping the ones that do not convert.
pub(crate) fn decode_schedule_rows(values: Vec<Value>) -> Vec<ScheduleEntry> {
    values
        .into_iter()
        .filter_map(|value| {
            let decoded = serde_json::from_value::<ScheduleRow>(value)
                .map_err(RowError::from)
                .and_then(ScheduleRow::into_entry);
            match decoded {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping undecodable schedule row");
                    None
                }
            }
        })
        .collect()
}

// ============================================================================
// Screens
// ============================================================================

/// A row of the `screens` table.
#[derive(Debug, Deserialize)]
pub(crate) struct ScreenRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ScreenRow {
    pub(crate) fn into_screen(self) -> Screen {
        // Status is advisory; an unknown value degrades to offline rather
        // than costing us the row.
        let status = match self.status.as_deref() {
            Some("online") => ScreenStatus::Online,
            Some("maintenance") => ScreenStatus::Maintenance,
            _ => ScreenStatus::Offline,
        };
        Screen {
            id: ScreenId::new(self.id),
            name: self.name,
            location: self.location,
            resolution: self.resolution,
            status,
            last_seen_at: self.last_seen,
            created_at: self.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        }
    }
}

/// Decodes a page of screen rows, dropping the ones that do not parse.
pub(crate) fn decode_screen_rows(values: Vec<Value>) -> Vec<Screen> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ScreenRow>(value) {
            Ok(row) => Some(row.into_screen()),
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable screen row");
                None
            }
        })
        .collect()
}
