//! Core types for Courseplay

use crate::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a mounted player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One selectable rendition, derived from a parsed manifest.
///
/// The list is replaced wholesale on each manifest parse and never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityLevel {
    /// Index into the engine's level list
    pub id: usize,
    pub height: u32,
    pub width: u32,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Menu label, e.g. "720p"
    pub name: String,
}

impl QualityLevel {
    pub fn new(id: usize, resolution: Option<Resolution>, bandwidth: u64) -> Self {
        match resolution {
            Some(r) => Self {
                id,
                height: r.height,
                width: r.width,
                bandwidth,
                name: format!("{}p", r.height),
            },
            None => Self {
                id,
                height: 0,
                width: 0,
                bandwidth,
                name: format!("{}k", bandwidth / 1000),
            },
        }
    }
}

/// Target of a set-quality intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualitySelection {
    /// Let the engine pick (sentinel -1 on the wire)
    Auto,
    /// Force a level by index
    Level(usize),
}

impl QualitySelection {
    pub const AUTO_INDEX: i64 = -1;

    /// Map a UI index (-1 = auto) to a selection
    pub fn from_index(index: i64) -> crate::Result<Self> {
        match index {
            Self::AUTO_INDEX => Ok(QualitySelection::Auto),
            i if i >= 0 => Ok(QualitySelection::Level(i as usize)),
            i => Err(Error::InvalidQuality(i)),
        }
    }

    pub fn level(&self) -> Option<usize> {
        match self {
            QualitySelection::Auto => None,
            QualitySelection::Level(i) => Some(*i),
        }
    }
}

/// Quality label shown on the quality button: "auto" or a level name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CurrentQuality {
    #[default]
    Auto,
    Named(String),
}

impl CurrentQuality {
    pub fn as_str(&self) -> &str {
        match self {
            CurrentQuality::Auto => "auto",
            CurrentQuality::Named(name) => name,
        }
    }
}

impl std::fmt::Display for CurrentQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for CurrentQuality {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for CurrentQuality {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<String> for CurrentQuality {
    fn from(s: String) -> Self {
        if s == "auto" {
            CurrentQuality::Auto
        } else {
            CurrentQuality::Named(s)
        }
    }
}

impl From<CurrentQuality> for String {
    fn from(q: CurrentQuality) -> Self {
        q.as_str().to_string()
    }
}

/// The fixed set of speeds offered in the settings menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub enum PlaybackRate {
    Half,
    ThreeQuarters,
    #[default]
    Normal,
    OneAndQuarter,
    OneAndHalf,
    Double,
}

impl PlaybackRate {
    pub const ALL: [PlaybackRate; 6] = [
        PlaybackRate::Half,
        PlaybackRate::ThreeQuarters,
        PlaybackRate::Normal,
        PlaybackRate::OneAndQuarter,
        PlaybackRate::OneAndHalf,
        PlaybackRate::Double,
    ];

    pub fn as_f64(&self) -> f64 {
        match self {
            PlaybackRate::Half => 0.5,
            PlaybackRate::ThreeQuarters => 0.75,
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndQuarter => 1.25,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PlaybackRate::ALL
            .into_iter()
            .find(|r| (r.as_f64() - value).abs() < f64::EPSILON)
            .ok_or(Error::InvalidPlaybackRate(value))
    }
}

impl From<PlaybackRate> for f64 {
    fn from(rate: PlaybackRate) -> Self {
        rate.as_f64()
    }
}

impl std::fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.as_f64())
    }
}

/// Playback state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No session attached
    #[default]
    Idle,
    /// Verifying the manifest and attaching the engine
    Loading,
    /// Ready, resource reports paused
    Paused,
    /// Resource reports playing
    Playing,
    /// Recoverable streaming fault, session kept alive
    Recovering,
    /// Fatal fault, session torn down; needs a full re-initialization
    Failed,
}

impl PlaybackPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: PlaybackPhase) -> bool {
        use PlaybackPhase::*;
        if *self == target || target == Idle {
            return true;
        }
        matches!(
            (self, target),
            // From Idle
            (Idle, Loading) |
            // From Loading
            (Loading, Paused) | (Loading, Playing) | (Loading, Recovering) | (Loading, Failed) |
            // From Paused
            (Paused, Playing) | (Paused, Recovering) | (Paused, Failed) |
            // From Playing
            (Playing, Paused) | (Playing, Recovering) | (Playing, Failed) |
            // From Recovering
            (Recovering, Playing) | (Recovering, Paused) | (Recovering, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackPhase::Failed)
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::Idle => write!(f, "idle"),
            PlaybackPhase::Loading => write!(f, "loading"),
            PlaybackPhase::Paused => write!(f, "paused"),
            PlaybackPhase::Playing => write!(f, "playing"),
            PlaybackPhase::Recovering => write!(f, "recovering"),
            PlaybackPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Icon on the mute button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeIcon {
    Audible,
    Muted,
}
