//! Content items: the atomic displayable units of the signage system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ModelError;

/// Minimum accepted duration for a content item, in seconds.
pub const MIN_DURATION_SECS: u32 = 1;
/// Maximum accepted duration for a content item, in seconds.
pub const MAX_DURATION_SECS: u32 = 300;

/// Styling defaults applied by the display surface when a text slide leaves
/// them unset. Kept here so demo content and tests agree with the renderer.
pub const DEFAULT_TEXT_FONT_SIZE: &str = "48px";
pub const DEFAULT_TEXT_COLOR: &str = "#1F2937";
pub const DEFAULT_TEXT_BACKGROUND: &str = "#F3F4F6";
pub const DEFAULT_TEXT_ALIGN: &str = "center";

/// Opaque content identity. The hosted backend issues UUID strings, the demo
/// fallback uses fixed literals; the engine never interprets the contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The four kinds of displayable content.
///
/// `Markup` is stored as `html` by the backend; [`ContentKind::parse`]
/// accepts both spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Video,
    Markup,
}

impl ContentKind {
    /// Parses a kind from its wire spelling. Returns `None` for unknown
    /// kinds so callers can skip rows they do not understand.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "markup" | "html" => Some(Self::Markup),
            _ => None,
        }
    }

    /// True for kinds rendered through a media URL (image and video).
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Markup => "markup",
        };
        f.write_str(s)
    }
}

/// Styled text slide payload.
///
/// Styling fields are optional; the display surface falls back to the
/// `DEFAULT_TEXT_*` constants when they are unset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextSlide {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
}

impl TextSlide {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: None,
            color: None,
            background_color: None,
            align: None,
        }
    }
}

/// Source descriptor for an image or video slide.
///
/// Either coordinate may be absent: `storage_path` points into the private
/// blob store (and needs signing before it can be fetched), `url` is a
/// directly fetchable literal. An item carrying neither can still be
/// scheduled; the media binding layer will flag it as unavailable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    /// Alternative text, or the original file name when nothing better exists.
    #[serde(default)]
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl MediaSource {
    /// True when there is no coordinate at all to fetch this media from.
    pub fn is_sourceless(&self) -> bool {
        self.url.is_none() && self.storage_path.is_none()
    }
}

/// Typed payload of a content item.
///
/// The variant *is* the item's kind: a text payload on a video item cannot
/// be represented, which is the whole "payload matches kind" invariant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentPayload {
    Text(TextSlide),
    Image(MediaSource),
    Video(MediaSource),
    Markup { html: String },
}

impl ContentPayload {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Image(_) => ContentKind::Image,
            Self::Video(_) => ContentKind::Video,
            Self::Markup { .. } => ContentKind::Markup,
        }
    }

    /// The media source, for image and video payloads.
    pub fn media(&self) -> Option<&MediaSource> {
        match self {
            Self::Image(media) | Self::Video(media) => Some(media),
            _ => None,
        }
    }
}

/// An atomic unit of displayable material.
///
/// Snapshots of these rows travel from the repositories through the schedule
/// resolver into the playback engine; the engine treats them as immutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub title: String,
    #[serde(flatten)]
    pub payload: ContentPayload,
    /// How long this item stays on screen, in seconds (1..=300).
    pub duration_secs: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        self.payload.kind()
    }

    /// True for items the media binding layer has to resolve a URL for.
    pub fn is_media(&self) -> bool {
        self.kind().is_media()
    }

    /// Blob-store path of this item's media, if any.
    pub fn storage_path(&self) -> Option<&str> {
        self.payload.media().and_then(|m| m.storage_path.as_deref())
    }

    /// Directly fetchable URL of this item's media, if any.
    pub fn literal_url(&self) -> Option<&str> {
        self.payload.media().and_then(|m| m.url.as_deref())
    }

    /// Checks the duration bound. The payload/kind invariant needs no check,
    /// it holds by construction.
    pub fn validate(&self) -> crate::Result<()> {
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(ModelError::InvalidDuration {
                actual: self.duration_secs,
                min: MIN_DURATION_SECS,
                max: MAX_DURATION_SECS,
            });
        }
        Ok(())
    }
}
