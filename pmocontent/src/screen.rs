//! Screens: the physical displays content is targeted at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier a player passes to mean "no particular screen": schedule
/// lookup is skipped entirely and the resolver goes straight to the
/// active-content pool.
pub const GENERIC_SCREEN: &str = "generic";

/// Opaque screen identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(pub String);

impl ScreenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScreenId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Reported player state, refreshed by heartbeats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenStatus {
    Online,
    #[default]
    Offline,
    Maintenance,
}

/// A registered display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub id: ScreenId,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Advertised pixel size, e.g. `"1920x1080"`. Informational only.
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub status: ScreenStatus,
    #[serde(default)]
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// How a playback request names its target screen.
///
/// The distinction matters to the resolver: `Screen` consults schedules,
/// the other two skip them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenRef {
    /// A concrete screen: schedules scoped to it apply.
    Screen(ScreenId),
    /// The "generic" pseudo-screen: never scheduled.
    Generic,
    /// No screen named at all.
    Unspecified,
}

impl ScreenRef {
    /// Reads an optional query/request parameter.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Unspecified,
            Some(s) if s.is_empty() => Self::Unspecified,
            Some(GENERIC_SCREEN) => Self::Generic,
            Some(s) => Self::Screen(ScreenId::from(s)),
        }
    }

    /// The concrete screen id, when there is one.
    pub fn screen_id(&self) -> Option<&ScreenId> {
        match self {
            Self::Screen(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ScreenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Screen(id) => f.write_str(id.as_str()),
            Self::Generic => f.write_str(GENERIC_SCREEN),
            Self::Unspecified => f.write_str("-"),
        }
    }
}
