//! Media resource and platform abstractions
//!
//! [`MediaElement`] is the playable resource (a `<video>` element in a
//! browser, a decoder pipeline elsewhere). Property writes go through it;
//! the authoritative outcome comes back as [`MediaEvent`]s on the channel
//! handed to the controller.

mod headless;

pub use headless::{AutoplayPolicy, HeadlessMedia, HeadlessPlatform};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

/// Rejection of a play request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    /// Autoplay policy or missing user gesture
    #[error("play() was not allowed: {0}")]
    NotAllowed(String),

    #[error("{0}")]
    Other(String),
}

/// Native media signal
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    TimeUpdate {
        current_time: f64,
        duration: Option<f64>,
    },
    VolumeChange {
        volume: f64,
        muted: bool,
    },
    RateChange {
        rate: f64,
    },
    LoadedMetadata {
        duration: Option<f64>,
    },
    Error {
        message: Option<String>,
    },
}

pub type MediaEventSender = mpsc::UnboundedSender<MediaEvent>;
pub type MediaEventReceiver = mpsc::UnboundedReceiver<MediaEvent>;

/// The underlying media resource
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Resolves once playback has been accepted
    async fn play(&self) -> Result<(), PlayError>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// `None` until metadata is known
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn is_muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);

    /// Whether the resource can play `mime` without an adaptive engine
    fn can_play_type(&self, mime: &str) -> bool;

    /// Point the resource at a URL it will load natively
    fn set_source(&self, url: &Url);
}

/// Rejected fullscreen or picture-in-picture request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlatformError(pub String);

/// Display-mode features of the host
#[async_trait]
pub trait Platform: Send + Sync {
    fn is_fullscreen(&self) -> bool;

    async fn request_fullscreen(&self) -> Result<(), PlatformError>;

    async fn exit_fullscreen(&self) -> Result<(), PlatformError>;

    /// Whether picture-in-picture can be requested at all
    fn pip_enabled(&self) -> bool;

    fn is_pip(&self) -> bool;

    async fn request_pip(&self) -> Result<(), PlatformError>;

    async fn exit_pip(&self) -> Result<(), PlatformError>;
}
