//! Published player state and its reducer
//!
//! Every source of change (media events, engine events, verification
//! results, intents) is turned into an [`Action`] and applied through
//! [`PlayerState::apply`]. The coupling rules (progress follows time,
//! fatal errors stop playback, notices never override a fatal message)
//! live here and nowhere else.

use crate::types::{CurrentQuality, PlaybackPhase, QualityLevel, VolumeIcon};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shown when playback could not start even muted
pub const AUTOPLAY_BLOCKED: &str = "Click to play (autoplay blocked)";
pub const NETWORK_RECOVERING: &str = "Network error - attempting to reconnect...";
pub const MEDIA_RECOVERING: &str = "Media error - attempting to recover...";
pub const FULLSCREEN_UNAVAILABLE: &str = "Fullscreen not available";
pub const PIP_UNAVAILABLE: &str = "Picture-in-Picture not available";

/// Message for a fatal engine error
pub fn playback_error(details: &str) -> String {
    format!("Playback error: {details}")
}

/// Message for an error reported by the media element itself
pub fn video_error(message: Option<&str>) -> String {
    format!("Video error: {}", message.unwrap_or("Unknown error"))
}

/// Player state as rendered by the control surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub phase: PlaybackPhase,
    pub is_playing: bool,
    /// 0-100
    pub progress: f64,
    /// Seconds; 0 while unknown
    pub duration: f64,
    pub current_time: f64,
    /// 0-1, kept while muted
    pub volume: f64,
    pub is_muted: bool,
    pub playback_rate: f64,
    /// User-visible message, fatal or advisory
    pub error: Option<String>,
    pub is_fullscreen: bool,
    pub is_pip: bool,
    pub current_quality: CurrentQuality,
    pub available_qualities: Vec<QualityLevel>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            is_playing: false,
            progress: 0.0,
            duration: 0.0,
            current_time: 0.0,
            volume: 1.0,
            is_muted: false,
            playback_rate: 1.0,
            error: None,
            is_fullscreen: false,
            is_pip: false,
            current_quality: CurrentQuality::Auto,
            available_qualities: Vec::new(),
        }
    }
}

/// A single state update
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// New session: drop everything tied to the previous video
    Reset,
    LoadStarted,
    ManifestParsed {
        qualities: Vec<QualityLevel>,
        duration: Option<f64>,
    },
    MetadataLoaded {
        duration: Option<f64>,
    },
    QualityChanged(CurrentQuality),
    Played,
    Paused,
    TimeUpdated {
        current_time: f64,
        duration: Option<f64>,
    },
    VolumeChanged {
        volume: f64,
        muted: bool,
    },
    RateChanged(f64),
    FullscreenChanged(bool),
    PipChanged(bool),
    /// Non-fatal, user-actionable message
    Notice(String),
    ClearNotice,
    /// Recoverable streaming fault with its advisory
    Recovering(String),
    /// Session-ending fault
    Fatal(String),
}

fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

impl PlayerState {
    /// Apply `action`; returns whether anything changed
    pub fn apply(&mut self, action: Action) -> bool {
        let before = self.clone();

        match action {
            Action::Reset => {
                // The media element outlives the session, so its audio
                // settings and display modes carry over
                *self = PlayerState {
                    volume: self.volume,
                    is_muted: self.is_muted,
                    playback_rate: self.playback_rate,
                    is_fullscreen: self.is_fullscreen,
                    is_pip: self.is_pip,
                    ..PlayerState::default()
                };
            }
            Action::LoadStarted => {
                self.transition(PlaybackPhase::Loading);
            }
            Action::ManifestParsed { qualities, duration } => {
                self.available_qualities = qualities;
                self.current_quality = CurrentQuality::Auto;
                self.error = None;
                if let Some(d) = usable_duration(duration) {
                    self.duration = d;
                }
                let target = if self.is_playing {
                    PlaybackPhase::Playing
                } else {
                    PlaybackPhase::Paused
                };
                self.transition(target);
            }
            Action::MetadataLoaded { duration } => {
                if let Some(d) = usable_duration(duration) {
                    self.duration = d;
                }
                if self.phase == PlaybackPhase::Loading {
                    self.error = None;
                    self.transition(PlaybackPhase::Paused);
                }
            }
            Action::QualityChanged(quality) => {
                self.current_quality = quality;
            }
            Action::Played => {
                if self.transition(PlaybackPhase::Playing) {
                    if before.phase == PlaybackPhase::Recovering {
                        self.error = None;
                    }
                    self.is_playing = true;
                }
            }
            Action::Paused => {
                if self.transition(PlaybackPhase::Paused) {
                    self.is_playing = false;
                }
            }
            Action::TimeUpdated {
                current_time,
                duration,
            } => {
                // Ticks before the duration is known carry no position
                if let Some(d) = usable_duration(duration) {
                    let advanced = current_time > self.current_time;
                    self.duration = d;
                    self.current_time = current_time.max(0.0);

                    // A moving playhead means in-place recovery worked
                    if advanced && self.phase == PlaybackPhase::Recovering {
                        self.recovered();
                    }
                }
            }
            Action::VolumeChanged { volume, muted } => {
                self.volume = volume.clamp(0.0, 1.0);
                self.is_muted = muted;
            }
            Action::RateChanged(rate) => {
                self.playback_rate = rate;
            }
            Action::FullscreenChanged(on) => {
                self.is_fullscreen = on;
            }
            Action::PipChanged(on) => {
                self.is_pip = on;
            }
            Action::Notice(message) => {
                if self.phase.is_terminal() {
                    debug!(%message, "Notice suppressed by fatal error");
                } else {
                    self.error = Some(message);
                }
            }
            Action::ClearNotice => {
                if !matches!(self.phase, PlaybackPhase::Failed | PlaybackPhase::Recovering) {
                    self.error = None;
                }
            }
            Action::Recovering(message) => {
                if self.transition(PlaybackPhase::Recovering) {
                    self.error = Some(message);
                }
            }
            Action::Fatal(message) => {
                self.transition(PlaybackPhase::Failed);
                self.error = Some(message);
                self.is_playing = false;
            }
        }

        self.progress = if self.duration > 0.0 {
            (self.current_time / self.duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        *self != before
    }

    fn recovered(&mut self) {
        let target = if self.is_playing {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Paused
        };
        if self.transition(target) {
            self.error = None;
        }
    }

    fn transition(&mut self, target: PlaybackPhase) -> bool {
        if !self.phase.can_transition_to(target) {
            debug!(from = %self.phase, to = %target, "Ignoring phase transition");
            return false;
        }
        if self.phase != target {
            debug!(from = %self.phase, to = %target, "Phase transition");
            self.phase = target;
        }
        true
    }

    pub fn volume_icon(&self) -> VolumeIcon {
        if self.is_muted {
            VolumeIcon::Muted
        } else {
            VolumeIcon::Audible
        }
    }

    /// Name of the level at `index`, if the last manifest had one
    pub fn quality_name(&self, index: usize) -> Option<&str> {
        self.available_qualities
            .iter()
            .find(|q| q.id == index)
            .map(|q| q.name.as_str())
    }
}
