//! In-memory media element and platform
//!
//! Behaves like a browser media element as far as the controller can tell:
//! property writes are applied immediately and echoed as events, play
//! requests are subject to an autoplay policy. The host side drives
//! metadata and the clock through [`HeadlessMedia::load_metadata`] and
//! [`HeadlessMedia::advance`].

use super::{
    MediaElement, MediaEvent, MediaEventReceiver, MediaEventSender, PlatformError, PlayError,
    Platform,
};
use crate::net::HLS_MIME;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

/// Which play requests the element accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AutoplayPolicy {
    /// Every play request succeeds
    #[default]
    Allowed,
    /// Only muted playback may start
    MutedOnly,
    /// Every play request is rejected
    Blocked,
}

#[derive(Debug)]
struct MediaProps {
    paused: bool,
    current_time: f64,
    duration: Option<f64>,
    volume: f64,
    muted: bool,
    rate: f64,
    source: Option<Url>,
}

impl Default for MediaProps {
    fn default() -> Self {
        Self {
            paused: true,
            current_time: 0.0,
            duration: None,
            volume: 1.0,
            muted: false,
            rate: 1.0,
            source: None,
        }
    }
}

/// Headless media element
pub struct HeadlessMedia {
    props: Mutex<MediaProps>,
    policy: Mutex<AutoplayPolicy>,
    native_hls: bool,
    events: MediaEventSender,
}

impl HeadlessMedia {
    /// Element without native HLS support
    pub fn new(policy: AutoplayPolicy) -> (Arc<Self>, MediaEventReceiver) {
        Self::build(policy, false)
    }

    /// Element that can play HLS manifests by itself
    pub fn native(policy: AutoplayPolicy) -> (Arc<Self>, MediaEventReceiver) {
        Self::build(policy, true)
    }

    fn build(policy: AutoplayPolicy, native_hls: bool) -> (Arc<Self>, MediaEventReceiver) {
        let (events, rx) = mpsc::unbounded_channel();
        let media = Arc::new(Self {
            props: Mutex::new(MediaProps::default()),
            policy: Mutex::new(policy),
            native_hls,
            events,
        });
        (media, rx)
    }

    fn props(&self) -> MutexGuard<'_, MediaProps> {
        self.props.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: MediaEvent) {
        // Nobody listening is fine: the player may have unmounted
        let _ = self.events.send(event);
    }

    pub fn set_policy(&self, policy: AutoplayPolicy) {
        *self.policy.lock().unwrap_or_else(PoisonError::into_inner) = policy;
    }

    /// Source assigned through [`MediaElement::set_source`]
    pub fn source(&self) -> Option<Url> {
        self.props().source.clone()
    }

    /// Metadata arrived: duration becomes known
    pub fn load_metadata(&self, duration: f64) {
        self.props().duration = Some(duration);
        self.emit(MediaEvent::LoadedMetadata {
            duration: Some(duration),
        });
    }

    /// Advance the playhead by `seconds` of wall time if playing.
    ///
    /// Reaching the end pauses the element.
    pub fn advance(&self, seconds: f64) {
        let (current_time, duration, ended) = {
            let mut p = self.props();
            if p.paused {
                return;
            }
            let mut t = p.current_time + seconds * p.rate;
            let mut ended = false;
            if let Some(d) = p.duration {
                if t >= d {
                    t = d;
                    ended = true;
                    p.paused = true;
                }
            }
            p.current_time = t;
            (t, p.duration, ended)
        };

        self.emit(MediaEvent::TimeUpdate {
            current_time,
            duration,
        });
        if ended {
            self.emit(MediaEvent::Pause);
        }
    }

    /// Simulate a decode failure surfaced by the element
    pub fn fail(&self, message: Option<&str>) {
        self.emit(MediaEvent::Error {
            message: message.map(str::to_string),
        });
    }
}

#[async_trait]
impl MediaElement for HeadlessMedia {
    async fn play(&self) -> Result<(), PlayError> {
        let policy = *self.policy.lock().unwrap_or_else(PoisonError::into_inner);
        let started = {
            let mut p = self.props();
            let allowed = match policy {
                AutoplayPolicy::Allowed => true,
                AutoplayPolicy::MutedOnly => p.muted,
                AutoplayPolicy::Blocked => false,
            };
            if !allowed {
                debug!(?policy, muted = p.muted, "play() rejected");
                return Err(PlayError::NotAllowed(
                    "play() failed because the user didn't interact with the document first".into(),
                ));
            }
            let was_paused = p.paused;
            p.paused = false;
            was_paused
        };

        if started {
            self.emit(MediaEvent::Play);
        }
        Ok(())
    }

    fn pause(&self) {
        let was_playing = {
            let mut p = self.props();
            let was_playing = !p.paused;
            p.paused = true;
            was_playing
        };
        if was_playing {
            self.emit(MediaEvent::Pause);
        }
    }

    fn is_paused(&self) -> bool {
        self.props().paused
    }

    fn current_time(&self) -> f64 {
        self.props().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        let (current_time, duration) = {
            let mut p = self.props();
            let upper = p.duration.unwrap_or(f64::INFINITY);
            p.current_time = seconds.clamp(0.0, upper);
            (p.current_time, p.duration)
        };
        self.emit(MediaEvent::TimeUpdate {
            current_time,
            duration,
        });
    }

    fn duration(&self) -> Option<f64> {
        self.props().duration
    }

    fn volume(&self) -> f64 {
        self.props().volume
    }

    fn set_volume(&self, volume: f64) {
        let (volume, muted) = {
            let mut p = self.props();
            p.volume = volume.clamp(0.0, 1.0);
            (p.volume, p.muted)
        };
        self.emit(MediaEvent::VolumeChange { volume, muted });
    }

    fn is_muted(&self) -> bool {
        self.props().muted
    }

    fn set_muted(&self, muted: bool) {
        let volume = {
            let mut p = self.props();
            p.muted = muted;
            p.volume
        };
        self.emit(MediaEvent::VolumeChange { volume, muted });
    }

    fn playback_rate(&self) -> f64 {
        self.props().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.props().rate = rate;
        self.emit(MediaEvent::RateChange { rate });
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.native_hls && mime.eq_ignore_ascii_case(HLS_MIME)
    }

    fn set_source(&self, url: &Url) {
        let mut p = self.props();
        p.source = Some(url.clone());
        p.duration = None;
        p.current_time = 0.0;
    }
}

#[derive(Debug, Default)]
struct DisplayModes {
    fullscreen: bool,
    pip: bool,
}

/// Headless display platform with switchable feature support
pub struct HeadlessPlatform {
    fullscreen_supported: bool,
    pip_supported: bool,
    modes: Mutex<DisplayModes>,
}

impl HeadlessPlatform {
    pub fn new(fullscreen_supported: bool, pip_supported: bool) -> Self {
        Self {
            fullscreen_supported,
            pip_supported,
            modes: Mutex::new(DisplayModes::default()),
        }
    }

    fn modes(&self) -> MutexGuard<'_, DisplayModes> {
        self.modes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[async_trait]
impl Platform for HeadlessPlatform {
    fn is_fullscreen(&self) -> bool {
        self.modes().fullscreen
    }

    async fn request_fullscreen(&self) -> Result<(), PlatformError> {
        if !self.fullscreen_supported {
            return Err(PlatformError("Fullscreen API is not supported".into()));
        }
        self.modes().fullscreen = true;
        Ok(())
    }

    async fn exit_fullscreen(&self) -> Result<(), PlatformError> {
        let mut modes = self.modes();
        if !modes.fullscreen {
            return Err(PlatformError("Document not in fullscreen".into()));
        }
        modes.fullscreen = false;
        Ok(())
    }

    fn pip_enabled(&self) -> bool {
        self.pip_supported
    }

    fn is_pip(&self) -> bool {
        self.modes().pip
    }

    async fn request_pip(&self) -> Result<(), PlatformError> {
        if !self.pip_supported {
            return Err(PlatformError("Picture-in-Picture is not enabled".into()));
        }
        self.modes().pip = true;
        Ok(())
    }

    async fn exit_pip(&self) -> Result<(), PlatformError> {
        let mut modes = self.modes();
        if !modes.pip {
            return Err(PlatformError("No Picture-in-Picture element".into()));
        }
        modes.pip = false;
        Ok(())
    }
}
