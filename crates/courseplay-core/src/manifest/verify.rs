//! Pre-flight check of a manifest before the streaming engine is attached.
//!
//! A wrong video id, a CORS misconfiguration and a server that is not ready
//! all look alike once the engine is running; checking up front yields a
//! specific message instead.

use super::has_hls_signature;
use crate::{
    config::PlayerConfig,
    error::VerifyError,
    net::{HttpFetch, RequestKind},
};
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

/// Bounded-retry manifest verifier
pub struct ManifestVerifier<F> {
    fetcher: F,
    attempts: u32,
    backoff: Duration,
}

impl<F: HttpFetch> ManifestVerifier<F> {
    pub fn new(fetcher: F, attempts: u32, backoff: Duration) -> Self {
        Self {
            fetcher,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(fetcher: F, config: &PlayerConfig) -> Self {
        Self::new(fetcher, config.verify_attempts, config.verify_backoff())
    }

    /// Succeeds once a GET returns 2xx with a body starting with `#EXTM3U`.
    ///
    /// Failed attempt `n` is followed by a `n * backoff` pause; the last
    /// failure is returned after its pause.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn verify(&self, url: &Url) -> Result<(), VerifyError> {
        let mut last_error = VerifyError::Network("no attempt made".into());

        for attempt in 1..=self.attempts {
            match self.check_once(url).await {
                Ok(()) => {
                    info!(attempt, "Manifest verification successful");
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Manifest verification attempt failed");
                    last_error = e;
                }
            }
            tokio::time::sleep(self.backoff * attempt).await;
        }

        Err(last_error)
    }

    async fn check_once(&self, url: &Url) -> Result<(), VerifyError> {
        let response = self
            .fetcher
            .get(url, RequestKind::Manifest)
            .await
            .map_err(|e| VerifyError::Network(e.to_string()))?;

        match response.status {
            404 => return Err(VerifyError::NotFound),
            _ if !response.is_success() => return Err(VerifyError::Status(response.status)),
            _ => {}
        }

        if !has_hls_signature(&response.body) {
            return Err(VerifyError::InvalidSignature);
        }

        Ok(())
    }
}
