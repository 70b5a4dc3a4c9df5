//! Schedules: time-and-weekday windows binding a playlist to a screen.

use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::playlist::PlaylistId;
use crate::screen::ScreenId;

/// Opaque schedule identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub String);

impl ScheduleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScheduleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A minute-of-day value carried as `"HH:MM"` on the wire.
///
/// Ordering is the numeric (hour, minute) order. For zero-padded `"HH:MM"`
/// strings this coincides with lexicographic string comparison, so window
/// checks agree with what an admin reading the raw column values expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> crate::Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(ModelError::InvalidTimeOfDay(format!(
                "{hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes since midnight.
    pub fn minute_of_day(&self) -> u16 {
        u16::from(self.hour) * 60 + u16::from(self.minute)
    }

    /// Truncates a wall-clock time to its minute of day.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ModelError::InvalidTimeOfDay(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(malformed)?;
        if h.len() != 2 || m.len() != 2 {
            return Err(malformed());
        }
        let hour: u8 = h.parse().map_err(|_| malformed())?;
        let minute: u8 = m.parse().map_err(|_| malformed())?;
        Self::new(hour, minute).map_err(|_| malformed())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// A set of weekdays, Sunday = 0 through Saturday = 6.
///
/// Carried as a JSON array of integers, matching the backend's
/// `days_of_week` column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);
    /// All seven days.
    pub const FULL: Self = Self(0b0111_1111);

    pub fn from_days(days: &[u8]) -> crate::Result<Self> {
        let mut set = Self::EMPTY;
        for &day in days {
            set.insert(day)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, day: u8) -> crate::Result<()> {
        if day > 6 {
            return Err(ModelError::InvalidWeekday(day));
        }
        self.0 |= 1 << day;
        Ok(())
    }

    pub fn contains_day(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.contains_day(weekday.num_days_from_sunday() as u8)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in ascending order (Sunday first).
    pub fn days(&self) -> Vec<u8> {
        (0..7).filter(|day| self.contains_day(*day)).collect()
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = ModelError;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_days(&days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.days()
    }
}

/// A time-windowed binding of a playlist to a screen.
///
/// `screen_id: None` is an unscoped schedule; the resolver ignores those
/// (only schedules bound to the requested screen are considered).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub playlist_id: PlaylistId,
    #[serde(default)]
    pub screen_id: Option<ScreenId>,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub days_of_week: WeekdaySet,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Schedule {
    /// Window and weekday-set invariants.
    ///
    /// `start_time < end_time` is a hard rule: overnight windows are not
    /// supported, and accepting them silently would change which playlist
    /// wins at, say, 23:30.
    pub fn validate(&self) -> crate::Result<()> {
        if self.start_time >= self.end_time {
            return Err(ModelError::InvalidTimeRange {
                start: self.start_time.to_string(),
                end: self.end_time.to_string(),
            });
        }
        if self.is_active && self.days_of_week.is_empty() {
            return Err(ModelError::EmptyWeekdaySet);
        }
        Ok(())
    }

    /// True iff the window covers `time` on `day`, inclusive on both ends.
    pub fn covers(&self, day: Weekday, time: TimeOfDay) -> bool {
        self.days_of_week.contains(day) && self.start_time <= time && time <= self.end_time
    }
}
