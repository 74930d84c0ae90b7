//! Adaptive streaming engine
//!
//! The controller talks to an HLS client through [`StreamingEngine`] and
//! hears back through [`EngineEvent`]s, never through engine-specific
//! callbacks. Each engine instance gets its own event channel; dropping the
//! receiving end detaches every listener at once.

mod abr;
#[cfg(feature = "hls")]
mod hls;

pub use abr::ThroughputEstimator;
#[cfg(feature = "hls")]
pub use hls::{HlsEngine, HlsEngineFactory};

use crate::{manifest::LevelInfo, Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

/// Error classes the controller reacts to differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Manifest/playlist/segment transport failure: reload later
    Network,
    /// Decode/buffer append failure: recover in place
    Media,
    /// Everything else: tear down
    Other,
}

/// Push notification from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Levels are known; duration comes from the first loaded level
    ManifestParsed {
        levels: Vec<LevelInfo>,
        duration: Option<f64>,
    },
    /// Playback moved to another level, by ABR or by force
    LevelSwitched { level: usize },
    Error {
        kind: ErrorKind,
        fatal: bool,
        details: String,
    },
}

pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Buffer and ABR tuning handed to the engine.
///
/// The buffer settings are passed through to the host media pipeline, which
/// owns segment buffering; the built-in engine only reports them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on forward buffer (seconds)
    pub max_max_buffer_length: f64,
    /// Upper bound on forward buffer (bytes)
    pub max_buffer_size: u64,
    /// Played media kept behind the playhead (seconds)
    pub back_buffer_length: f64,
    /// Offload segment parsing to a background worker
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    /// Level to start on; `None` lets ABR pick
    pub start_level: Option<usize>,
    /// Bandwidth estimate before any measurement (bps)
    pub default_bandwidth_estimate: u64,
    /// Share of the estimate a level may use
    pub bandwidth_safety_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_max_buffer_length: 600.0,
            max_buffer_size: 60 * 1000 * 1000,
            back_buffer_length: 30.0,
            enable_worker: true,
            low_latency_mode: true,
            start_level: None,
            default_bandwidth_estimate: 500_000,
            bandwidth_safety_factor: 0.8,
        }
    }
}

/// Surface of an HLS client as driven by the playback controller
pub trait StreamingEngine: Send {
    /// Remember the manifest to load
    fn load_source(&mut self, url: Url);

    /// Bind to the player's media resource; loading starts once a source is also set
    fn attach_media(&mut self);

    /// (Re)load the manifest, e.g. after a network error
    fn start_load(&mut self);

    /// Reset the media pipeline in place after a decode error.
    ///
    /// Decode state belongs to the host pipeline behind the media element.
    fn recover_media_error(&mut self);

    /// Force a level, or `None` to hand selection back to ABR
    fn set_current_level(&mut self, level: Option<usize>);

    fn current_level(&self) -> Option<usize>;

    /// Stop all activity; no events are emitted afterwards
    fn destroy(&mut self);
}

/// Creates engine instances; one live instance per mounted player
pub trait EngineFactory: Send + Sync {
    /// Whether this environment can run the engine at all
    fn is_supported(&self) -> bool;

    fn create(&self, config: &EngineConfig, events: EngineEventSender) -> Result<Box<dyn StreamingEngine>>;
}

/// Factory for hosts without an adaptive engine; playback falls back to the
/// media element's native HLS support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeOnly;

impl EngineFactory for NativeOnly {
    fn is_supported(&self) -> bool {
        false
    }

    fn create(&self, _config: &EngineConfig, _events: EngineEventSender) -> Result<Box<dyn StreamingEngine>> {
        Err(Error::UnsupportedFormat)
    }
}

/// Fresh event channel for a new engine instance
pub fn event_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}
