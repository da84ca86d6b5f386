/// GridSlot, RainIntensity, ForecastEntry, Forecast, FetchError, PublishError
/// core data structures and error handling
///
/// Core data types for the rain alarm service.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no external dependencies beyond `chrono` for the
/// wall clock.

use chrono::{Local, NaiveTime, Timelike};
use std::fmt;

// ---------------------------------------------------------------------------
// Grid constants
// ---------------------------------------------------------------------------

/// Width of one forecast slot, in minutes.
pub const SLOT_MINUTES: u16 = 5;

/// Minutes in one day. Slots wrap modulo this value.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Number of slots in one day.
pub const SLOTS_PER_DAY: usize = (MINUTES_PER_DAY / SLOT_MINUTES) as usize;

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// A time of day rounded down to the 5-minute grid, stored as minutes since
/// midnight in `[0, 1440)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridSlot(u16);

impl GridSlot {
    /// Builds a slot from hour and minute, rounding the minute down to the
    /// grid. Returns `None` if the hour or minute is out of range.
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self::from_minutes(hour * 60 + minute))
    }

    /// Builds a slot from minutes since midnight. Values past midnight wrap
    /// and the result is rounded down to the grid.
    pub fn from_minutes(minutes: u16) -> Self {
        let minutes = minutes % MINUTES_PER_DAY;
        GridSlot(minutes - minutes % SLOT_MINUTES)
    }

    /// Parses an `HH:MM` label such as `"17:20"` or `"7:05"`.
    pub fn parse(label: &str) -> Option<Self> {
        let (hour, minute) = label.trim().split_once(':')?;
        let hour = hour.trim();
        let minute = minute.trim();
        if hour.is_empty() || minute.len() != 2 {
            return None;
        }
        if !hour.chars().chain(minute.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        Self::from_hm(hour.parse().ok()?, minute.parse().ok()?)
    }

    pub fn from_time(time: NaiveTime) -> Self {
        // hour() < 24 and minute() < 60 always hold for NaiveTime
        Self::from_minutes((time.hour() * 60 + time.minute()) as u16)
    }

    /// The slot containing the current local wall-clock time.
    pub fn now_local() -> Self {
        Self::from_time(Local::now().time())
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// The slot `steps` grid steps later, wrapping past midnight.
    pub fn advance(self, steps: usize) -> Self {
        let offset = (steps % SLOTS_PER_DAY) as u16 * SLOT_MINUTES;
        GridSlot((self.0 + offset) % MINUTES_PER_DAY)
    }

    /// `count` consecutive slots starting at `self`.
    pub fn following(self, count: usize) -> impl Iterator<Item = GridSlot> {
        (0..count).map(move |step| self.advance(step))
    }
}

impl fmt::Display for GridSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

// ---------------------------------------------------------------------------
// Rain intensity
// ---------------------------------------------------------------------------

/// Rain intensity levels, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RainIntensity {
    None = 0,
    VeryLight = 1,
    Light = 2,
    Moderate = 3,
    Heavy = 4,
    VeryHeavy = 5,
    Extreme = 6,
}

/// Color tokens used by the nowcast table, mapped to intensity levels.
pub static COLOR_TABLE: &[(&str, RainIntensity)] = &[
    ("fff", RainIntensity::None),
    ("bfd4ff", RainIntensity::VeryLight),
    ("6699ff", RainIntensity::Light),
    ("004ce5", RainIntensity::Moderate),
    ("002673", RainIntensity::Heavy),
    ("ffa800", RainIntensity::VeryHeavy),
    ("e60000", RainIntensity::Extreme),
];

impl RainIntensity {
    /// Looks up a color token (without the leading `#`). Matching is exact:
    /// only the spelling used in [`COLOR_TABLE`] is recognized.
    ///
    /// Returns `None` for tokens missing from [`COLOR_TABLE`]; callers decide
    /// the fallback.
    pub fn from_color(token: &str) -> Option<Self> {
        COLOR_TABLE
            .iter()
            .find(|(color, _)| *color == token)
            .map(|(_, level)| *level)
    }

    /// Looks up a color token, falling back to `VeryLight` when the token is
    /// unknown. A rain marker that cannot be classified still counts as rain.
    pub fn from_color_or_default(token: &str) -> Self {
        Self::from_color(token).unwrap_or(RainIntensity::VeryLight)
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn is_rain(self) -> bool {
        self > RainIntensity::None
    }
}

impl fmt::Display for RainIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// One row of the nowcast table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastEntry {
    pub slot: GridSlot,
    pub intensity: RainIntensity,
}

/// All entries parsed from a single upstream payload, in discovery order.
///
/// A `Forecast` is never merged with another one: each fetch produces a new
/// value which replaces the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forecast {
    entries: Vec<ForecastEntry>,
}

impl Forecast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an intensity for a slot. An existing entry for the same slot
    /// keeps its position and takes the new intensity.
    pub fn insert(&mut self, slot: GridSlot, intensity: RainIntensity) {
        match self.entries.iter_mut().find(|e| e.slot == slot) {
            Some(existing) => existing.intensity = intensity,
            None => self.entries.push(ForecastEntry { slot, intensity }),
        }
    }

    pub fn get(&self, slot: GridSlot) -> Option<RainIntensity> {
        self.entries
            .iter()
            .find(|e| e.slot == slot)
            .map(|e| e.intensity)
    }

    pub fn entries(&self) -> &[ForecastEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(GridSlot, RainIntensity)> for Forecast {
    fn from_iter<I: IntoIterator<Item = (GridSlot, RainIntensity)>>(iter: I) -> Self {
        let mut forecast = Forecast::new();
        for (slot, intensity) in iter {
            forecast.insert(slot, intensity);
        }
        forecast
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching the nowcast page.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    Http(String),
    /// The request did not complete within the configured timeout.
    Timeout,
    /// A local replay file could not be read.
    Io(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(msg) => write!(f, "HTTP request failed: {}", msg),
            FetchError::Timeout => write!(f, "HTTP request timeout"),
            FetchError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors that can arise when delivering the alarm signal.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishError {
    /// The message could not be queued by the client.
    Client(String),
    /// The broker could not be reached or dropped the connection.
    Connection(String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Client(msg) => write!(f, "publish rejected by client: {}", msg),
            PublishError::Connection(msg) => write!(f, "broker connection failed: {}", msg),
        }
    }
}

impl std::error::Error for PublishError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
