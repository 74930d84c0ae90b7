//! Courseplay Core - Headless course video player
//!
//! This crate provides the playback side of the course player:
//! - Manifest verification against the HLS origin
//! - Adaptive streaming engine (HLS over m3u8-rs, throughput ABR)
//! - Playback controller reconciled against media-element events
//! - Control surface UI state with inactivity and flash timers
//! - Video catalog client
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Courseplay Core                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐   intents   ┌──────────────┐                  │
//! │  │   Control    │────────────▶│   Player     │  watch channel   │
//! │  │   Surface    │◀────────────│    Task      │────────────▶ UI  │
//! │  └──────────────┘   timers    └──────┬───────┘                  │
//! │                                      │                          │
//! │                               ┌──────┴───────┐                  │
//! │                               │  Playback    │                  │
//! │                               │  Controller  │                  │
//! │                               └──┬────┬───┬──┘                  │
//! │                 ┌────────────────┘    │   └───────────┐         │
//! │          ┌──────┴───────┐  ┌──────────┴───┐  ┌────────┴──────┐  │
//! │          │   Manifest   │  │  Streaming   │  │    Media      │  │
//! │          │   Verifier   │  │   Engine     │  │   Element     │  │
//! │          └──────┬───────┘  └──────┬───────┘  └───────────────┘  │
//! │                 └────────┬────────┘                             │
//! │                   ┌──────┴───────┐                              │
//! │                   │  HttpFetch   │                              │
//! │                   └──────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod media;
pub mod net;
pub mod player;
pub mod state;
pub mod surface;
pub mod timer;
pub mod types;
pub mod view;

pub use catalog::{CatalogClient, VideoRecord};
pub use config::PlayerConfig;
pub use controller::{ControllerDeps, PlaybackController};
pub use engine::{EngineConfig, EngineEvent, EngineFactory, ErrorKind, NativeOnly, StreamingEngine};
#[cfg(feature = "hls")]
pub use engine::{HlsEngine, HlsEngineFactory};
pub use error::{Error, Result, VerifyError};
pub use manifest::ManifestVerifier;
pub use media::{AutoplayPolicy, HeadlessMedia, HeadlessPlatform, MediaElement, MediaEvent, Platform};
pub use net::{HttpFetch, ReqwestFetcher};
pub use player::{Intent, Player, PlayerHandle, PlayerSnapshot};
pub use state::PlayerState;
pub use surface::UiState;
pub use types::*;
pub use view::ControlsView;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Courseplay Core initialized");
}
