//! Player configuration

use crate::{engine::EngineConfig, Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable overriding the API origin
pub const API_BASE_ENV: &str = "COURSEPLAY_API_BASE_URL";

/// Default API origin when nothing is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:3000";

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Origin serving `/api/videos` and the HLS manifests
    pub api_base_url: String,
    /// Manifest verification attempts before giving up
    pub verify_attempts: u32,
    /// Backoff unit; attempt `n` waits `n * verify_backoff_ms`
    pub verify_backoff_ms: u64,
    /// Delay before reloading the manifest after a fatal network error
    pub network_retry_delay_ms: u64,
    /// Pointer inactivity before the control bar hides
    pub controls_hide_delay_ms: u64,
    /// How long the play/pause flash icon stays up
    pub flash_duration_ms: u64,
    /// Step for the backward/forward buttons (seconds)
    pub seek_step_secs: f64,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Streaming engine tuning
    pub engine: EngineConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            verify_attempts: 2,
            verify_backoff_ms: 500,
            network_retry_delay_ms: 3000,
            controls_hide_delay_ms: 3000,
            flash_duration_ms: 1000,
            seek_step_secs: 5.0,
            request_timeout_ms: 10_000,
            engine: EngineConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Defaults, with the API origin taken from `COURSEPLAY_API_BASE_URL` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                config.api_base_url = base.trim().to_string();
            }
        }
        config
    }

    /// Builder-style override of the API origin
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base_url = base.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.verify_attempts == 0 {
            return Err(Error::InvalidConfig("verify_attempts must be at least 1".into()));
        }
        let base = self.api_base()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "api_base_url must be http(s), got '{}'",
                base.scheme()
            )));
        }
        if self.seek_step_secs <= 0.0 || !self.seek_step_secs.is_finite() {
            return Err(Error::InvalidConfig("seek_step_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn api_base(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_base_url)?)
    }

    /// `{api_base}/api/videos/stream/{video_id}/master.m3u8`
    pub fn manifest_url(&self, video_id: &str) -> Result<Url> {
        self.endpoint(&["api", "videos", "stream", video_id, "master.m3u8"])
    }

    /// `{api_base}/api/videos`
    pub fn catalog_url(&self) -> Result<Url> {
        self.endpoint(&["api", "videos"])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base()?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidConfig(format!("'{}' cannot be a base URL", self.api_base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Backoff unit of the manifest verifier
    pub fn verify_backoff(&self) -> Duration {
        Duration::from_millis(self.verify_backoff_ms)
    }

    pub fn network_retry_delay(&self) -> Duration {
        Duration::from_millis(self.network_retry_delay_ms)
    }

    pub fn controls_hide_delay(&self) -> Duration {
        Duration::from_millis(self.controls_hide_delay_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
