//! HTTP access to the HLS origin
//!
//! Every request the player makes (manifest verification, playlists,
//! segments, the catalog) goes through [`HttpFetch`], so the request policy lives in one
//! place: no credentials, caching disabled.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// MIME type of HLS playlists
pub const HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// What a request is for; selects headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Master playlist requested by the verifier or the engine
    Manifest,
    /// Variant/media playlist
    Playlist,
    /// Media segment
    Segment,
    /// JSON API call, e.g. the video catalog
    Api,
}

/// A completed HTTP exchange, whatever the status
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
    /// Wall time spent on the request, used for throughput estimates
    pub elapsed: Duration,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure (no HTTP status available)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

/// GET access to the origin
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &Url, kind: RequestKind) -> Result<FetchResponse, FetchError>;
}

#[async_trait]
impl<T: HttpFetch + ?Sized> HttpFetch for Arc<T> {
    async fn get(&self, url: &Url, kind: RequestKind) -> Result<FetchResponse, FetchError> {
        (**self).get(url, kind).await
    }
}

/// reqwest-backed fetcher.
///
/// The client is built without a cookie store, so no credentials are ever attached.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn request(&self, url: &Url, kind: RequestKind) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(url.clone())
            .header(header::CACHE_CONTROL, "no-cache");
        match kind {
            RequestKind::Manifest => builder.header(header::CONTENT_TYPE, HLS_MIME),
            RequestKind::Api => builder.header(header::ACCEPT, "application/json"),
            RequestKind::Playlist | RequestKind::Segment => builder,
        }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &Url, kind: RequestKind) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();

        let response = self.request(url, kind).send().await.map_err(map_reqwest)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest)?;

        let elapsed = start.elapsed();
        debug!(
            url = %url,
            ?kind,
            status,
            bytes = body.len(),
            elapsed_ms = elapsed.as_millis(),
            "Fetched"
        );

        Ok(FetchResponse {
            status,
            body,
            elapsed,
        })
    }
}

fn map_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(FetchResponse::new(200, "ok").is_success());
        assert!(FetchResponse::new(204, "").is_success());
        assert!(!FetchResponse::new(304, "").is_success());
        assert!(!FetchResponse::new(404, "").is_success());
    }

    #[test]
    fn test_manifest_request_headers() {
        let fetcher = ReqwestFetcher::new(Duration::from_secs(1)).unwrap();
        let url = Url::parse("https://example.com/master.m3u8").unwrap();

        let request = fetcher.request(&url, RequestKind::Manifest).build().unwrap();
        assert_eq!(request.headers()[header::CACHE_CONTROL], "no-cache");
        assert_eq!(request.headers()[header::CONTENT_TYPE], HLS_MIME);
        assert!(request.headers().get(header::COOKIE).is_none());

        let segment = fetcher.request(&url, RequestKind::Segment).build().unwrap();
        assert_eq!(segment.headers()[header::CACHE_CONTROL], "no-cache");
        assert!(segment.headers().get(header::CONTENT_TYPE).is_none());
    }
}
