//! Built-in HLS engine over m3u8-rs
//!
//! Loads the multivariant playlist, enumerates levels, loads the first
//! level's media playlist for the duration, and handles level switching.
//! Segment download and decode belong to the media pipeline behind the
//! player's media element, which reports download timings back through
//! [`HlsEngine::report_download`] so automatic selection can follow the
//! measured bandwidth.

use super::{
    EngineConfig, EngineEvent, EngineEventSender, EngineFactory, ErrorKind, StreamingEngine,
    ThroughputEstimator,
};
use crate::{
    manifest::{parse_media_playlist, parse_playlist, LevelInfo, ParsedPlaylist},
    net::{HttpFetch, RequestKind},
    Result,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// State shared between the engine handle and its load task
struct Shared {
    events: EngineEventSender,
    destroyed: bool,
    levels: Vec<LevelInfo>,
    current: Option<usize>,
    forced: Option<usize>,
    abr: ThroughputEstimator,
}

impl Shared {
    fn emit(&self, event: EngineEvent) {
        if self.destroyed {
            debug!(?event, "Engine destroyed, event dropped");
            return;
        }
        let _ = self.events.send(event);
    }

    fn fail(&self, kind: ErrorKind, details: &str) {
        self.emit(EngineEvent::Error {
            kind,
            fatal: true,
            details: details.to_string(),
        });
    }

    /// Follow the bandwidth estimate unless a level is forced
    fn select_auto(&mut self) {
        if self.forced.is_some() || self.levels.is_empty() {
            return;
        }
        let Some(level) = self.abr.select(&self.levels) else {
            return;
        };
        if self.current != Some(level) {
            debug!(level, estimate = self.abr.estimate(), "ABR level switch");
            self.current = Some(level);
            self.emit(EngineEvent::LevelSwitched { level });
        }
    }

    fn record(&mut self, bytes: usize, elapsed: Duration) {
        self.abr.record(bytes, elapsed);
        self.select_auto();
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// HLS engine instance bound to one player
pub struct HlsEngine<F> {
    fetcher: Arc<F>,
    config: EngineConfig,
    shared: Arc<Mutex<Shared>>,
    source: Option<Url>,
    attached: bool,
    load_task: Option<JoinHandle<()>>,
    media_recoveries: u32,
}

impl<F: HttpFetch + 'static> HlsEngine<F> {
    pub fn new(fetcher: Arc<F>, config: EngineConfig, events: EngineEventSender) -> Self {
        info!(
            max_buffer_length = config.max_max_buffer_length,
            max_buffer_size = config.max_buffer_size,
            back_buffer_length = config.back_buffer_length,
            enable_worker = config.enable_worker,
            low_latency = config.low_latency_mode,
            "HLS engine created"
        );

        let abr = ThroughputEstimator::new(config.default_bandwidth_estimate, config.bandwidth_safety_factor);

        Self {
            fetcher,
            shared: Arc::new(Mutex::new(Shared {
                events,
                destroyed: false,
                levels: Vec::new(),
                current: None,
                forced: None,
                abr,
            })),
            config,
            source: None,
            attached: false,
            load_task: None,
            media_recoveries: 0,
        }
    }

    /// Levels from the last successful manifest load
    pub fn levels(&self) -> Vec<LevelInfo> {
        lock(&self.shared).levels.clone()
    }

    pub fn media_recoveries(&self) -> u32 {
        self.media_recoveries
    }

    pub fn bandwidth_estimate(&self) -> u64 {
        lock(&self.shared).abr.estimate()
    }

    /// Feed a segment download timing from the media pipeline
    pub fn report_download(&self, bytes: usize, elapsed: Duration) {
        let mut shared = lock(&self.shared);
        if shared.destroyed {
            return;
        }
        shared.record(bytes, elapsed);
    }

    fn is_destroyed(&self) -> bool {
        lock(&self.shared).destroyed
    }
}

impl<F: HttpFetch + 'static> StreamingEngine for HlsEngine<F> {
    fn load_source(&mut self, url: Url) {
        debug!(url = %url, "Source set");
        self.source = Some(url);
        if self.attached {
            self.start_load();
        }
    }

    fn attach_media(&mut self) {
        if self.attached {
            return;
        }
        self.attached = true;
        if self.source.is_some() {
            self.start_load();
        }
    }

    fn start_load(&mut self) {
        if self.is_destroyed() {
            return;
        }
        let Some(url) = self.source.clone() else {
            warn!("start_load called without a source");
            return;
        };

        if let Some(task) = self.load_task.take() {
            task.abort();
        }

        info!(url = %url, "Loading manifest");
        self.load_task = Some(tokio::spawn(load_manifest(
            self.fetcher.clone(),
            url,
            self.shared.clone(),
            self.config.start_level,
        )));
    }

    fn recover_media_error(&mut self) {
        if self.is_destroyed() {
            return;
        }
        // Decode state lives in the host media pipeline; nothing to rebuild here
        self.media_recoveries += 1;
        info!(recoveries = self.media_recoveries, "Recovering media pipeline");
    }

    fn set_current_level(&mut self, level: Option<usize>) {
        let mut shared = lock(&self.shared);
        if shared.destroyed {
            return;
        }

        // Levels not known yet: applied when the manifest loads
        if shared.levels.is_empty() {
            shared.forced = level;
            return;
        }

        let Some(target) = level else {
            shared.forced = None;
            debug!(estimate = shared.abr.estimate(), "Automatic level selection enabled");
            shared.select_auto();
            return;
        };

        if target >= shared.levels.len() {
            warn!(level = target, available = shared.levels.len(), "Ignoring unknown level");
            return;
        }
        shared.forced = Some(target);

        if shared.current != Some(target) {
            shared.current = Some(target);
            shared.emit(EngineEvent::LevelSwitched { level: target });
        }
    }

    fn current_level(&self) -> Option<usize> {
        lock(&self.shared).current
    }

    fn destroy(&mut self) {
        lock(&self.shared).destroyed = true;
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
        self.source = None;
        self.attached = false;
        info!("HLS engine destroyed");
    }
}

impl<F> Drop for HlsEngine<F> {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }
}

#[instrument(skip(fetcher, shared))]
async fn load_manifest<F: HttpFetch>(
    fetcher: Arc<F>,
    url: Url,
    shared: Arc<Mutex<Shared>>,
    start_level: Option<usize>,
) {
    let response = match fetcher.get(&url, RequestKind::Manifest).await {
        Ok(r) if r.is_success() => r,
        Ok(r) => {
            warn!(status = r.status, "Manifest load failed");
            lock(&shared).fail(ErrorKind::Network, "manifestLoadError");
            return;
        }
        Err(e) => {
            warn!(error = %e, "Manifest load failed");
            lock(&shared).fail(ErrorKind::Network, "manifestLoadError");
            return;
        }
    };
    lock(&shared).record(response.body.len(), response.elapsed);

    let (levels, known_duration) = match parse_playlist(&response.body, &url) {
        Ok(ParsedPlaylist::Master(levels)) => (levels, None),
        Ok(ParsedPlaylist::Media(summary)) => {
            let single = LevelInfo {
                bandwidth: 0,
                resolution: None,
                codecs: None,
                frame_rate: None,
                uri: url.clone(),
            };
            (vec![single], Some(summary.duration))
        }
        Err(e) => {
            warn!(error = %e, "Manifest parse failed");
            lock(&shared).fail(ErrorKind::Other, "manifestParsingError");
            return;
        }
    };

    let start = {
        let s = lock(&shared);
        s.forced
            .or(start_level)
            .filter(|i| *i < levels.len())
            .or_else(|| s.abr.select(&levels))
            .unwrap_or(0)
    };

    let duration = match known_duration {
        Some(d) => d,
        None => match load_level(fetcher.as_ref(), &levels[0].uri, &shared).await {
            Ok(d) => d,
            Err((kind, details)) => {
                lock(&shared).fail(kind, details);
                return;
            }
        },
    };

    info!(levels = levels.len(), start, duration, "Manifest parsed");

    let mut s = lock(&shared);
    s.levels = levels.clone();
    s.current = Some(start);
    s.emit(EngineEvent::ManifestParsed {
        levels,
        duration: Some(duration),
    });
    s.emit(EngineEvent::LevelSwitched { level: start });
}

/// Load a level's media playlist and return its duration
async fn load_level<F: HttpFetch>(
    fetcher: &F,
    uri: &Url,
    shared: &Mutex<Shared>,
) -> std::result::Result<f64, (ErrorKind, &'static str)> {
    let response = match fetcher.get(uri, RequestKind::Playlist).await {
        Ok(r) if r.is_success() => r,
        Ok(r) => {
            warn!(uri = %uri, status = r.status, "Level load failed");
            return Err((ErrorKind::Network, "levelLoadError"));
        }
        Err(e) => {
            warn!(uri = %uri, error = %e, "Level load failed");
            return Err((ErrorKind::Network, "levelLoadError"));
        }
    };
    lock(shared).record(response.body.len(), response.elapsed);

    parse_media_playlist(&response.body)
        .map(|summary| summary.duration)
        .map_err(|e| {
            warn!(uri = %uri, error = %e, "Level parse failed");
            (ErrorKind::Other, "levelParsingError")
        })
}

/// Factory producing [`HlsEngine`]s that share one fetcher
pub struct HlsEngineFactory<F> {
    fetcher: Arc<F>,
}

impl<F> HlsEngineFactory<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: HttpFetch + 'static> EngineFactory for HlsEngineFactory<F> {
    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, config: &EngineConfig, events: EngineEventSender) -> Result<Box<dyn StreamingEngine>> {
        Ok(Box::new(HlsEngine::new(self.fetcher.clone(), config.clone(), events)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::event_channel;
    use crate::net::{FetchError, FetchResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2800000,RESOLUTION=1280x720
720p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080p.m3u8
";

    const LEVEL: &str = "#EXTM3U
#EXT-X-TARGETDURATION:10
#EXTINF:10.0,
a.ts
#EXTINF:10.0,
b.ts
#EXTINF:4.0,
c.ts
#EXT-X-ENDLIST
";

    struct Origin(HashMap<String, FetchResponse>);

    #[async_trait]
    impl HttpFetch for Origin {
        async fn get(&self, url: &Url, _kind: RequestKind) -> std::result::Result<FetchResponse, FetchError> {
            self.0
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| FetchError::Transport("connection refused".into()))
        }
    }

    fn origin(entries: &[(&str, u16, &str)]) -> Arc<Origin> {
        Arc::new(Origin(
            entries
                .iter()
                .map(|(url, status, body)| (url.to_string(), FetchResponse::new(*status, body.to_string())))
                .collect(),
        ))
    }

    fn master_url() -> Url {
        Url::parse("https://cdn.example.com/v/master.m3u8").unwrap()
    }

    fn engine(origin: Arc<Origin>) -> (HlsEngine<Origin>, crate::engine::EngineEventReceiver) {
        let (tx, rx) = event_channel();
        (HlsEngine::new(origin, EngineConfig::default(), tx), rx)
    }

    fn full_origin() -> Arc<Origin> {
        origin(&[
            ("https://cdn.example.com/v/master.m3u8", 200, MASTER),
            ("https://cdn.example.com/v/360p.m3u8", 200, LEVEL),
        ])
    }

    #[tokio::test]
    async fn test_loads_after_source_and_attach() {
        let (mut hls, mut rx) = engine(full_origin());

        hls.load_source(master_url());
        assert!(rx.try_recv().is_err(), "nothing loads before media is attached");
        hls.attach_media();

        match rx.recv().await.unwrap() {
            EngineEvent::ManifestParsed { levels, duration } => {
                assert_eq!(levels.len(), 3);
                assert_eq!(duration, Some(24.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::LevelSwitched { level: 0 });
        assert_eq!(hls.current_level(), Some(0));
    }

    #[tokio::test]
    async fn test_forced_and_auto_levels() {
        let (mut hls, mut rx) = engine(full_origin());
        hls.load_source(master_url());
        hls.attach_media();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        hls.set_current_level(Some(2));
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LevelSwitched { level: 2 });

        // Same level again: no switch
        hls.set_current_level(Some(2));
        assert!(rx.try_recv().is_err());

        // Unknown level ignored
        hls.set_current_level(Some(7));
        assert!(rx.try_recv().is_err());
        assert_eq!(hls.current_level(), Some(2));

        // Back to auto: the estimate only affords the cheapest level
        hls.set_current_level(None);
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LevelSwitched { level: 0 });
        assert_eq!(hls.current_level(), Some(0));

        // Already on the level ABR wants: no switch
        hls.set_current_level(None);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_auto_follows_reported_bandwidth() {
        let (mut hls, mut rx) = engine(full_origin());
        hls.load_source(master_url());
        hls.attach_media();
        rx.recv().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::LevelSwitched { level: 0 });

        // 1 MB in one second is 8 Mbps, 6.4 Mbps after the safety factor
        hls.report_download(1_000_000, Duration::from_secs(1));
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LevelSwitched { level: 2 });
        assert_eq!(hls.current_level(), Some(2));

        // A forced level is left alone
        hls.set_current_level(Some(1));
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LevelSwitched { level: 1 });
        hls.report_download(1_000_000, Duration::from_secs(1));
        assert!(rx.try_recv().is_err());
        assert_eq!(hls.current_level(), Some(1));
    }

    #[tokio::test]
    async fn test_auto_after_forced_level_drops_back() {
        const LADDER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=640x360
360p.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080
1080p.m3u8
";
        let (mut hls, mut rx) = engine(origin(&[
            ("https://cdn.example.com/v/master.m3u8", 200, LADDER),
            ("https://cdn.example.com/v/360p.m3u8", 200, LEVEL),
        ]));
        hls.load_source(master_url());
        hls.attach_media();
        rx.recv().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::LevelSwitched { level: 0 });

        hls.set_current_level(Some(1));
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LevelSwitched { level: 1 });

        hls.set_current_level(None);
        assert_eq!(rx.try_recv().unwrap(), EngineEvent::LevelSwitched { level: 0 });
        assert_eq!(hls.current_level(), Some(0));
    }

    #[tokio::test]
    async fn test_missing_manifest_is_fatal_network_error() {
        let (mut hls, mut rx) = engine(origin(&[("https://cdn.example.com/v/master.m3u8", 404, "")]));
        hls.load_source(master_url());
        hls.attach_media();

        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::Error {
                kind: ErrorKind::Network,
                fatal: true,
                details: "manifestLoadError".into()
            }
        );
    }

    #[tokio::test]
    async fn test_level_load_failure() {
        let (mut hls, mut rx) = engine(origin(&[("https://cdn.example.com/v/master.m3u8", 200, MASTER)]));
        hls.load_source(master_url());
        hls.attach_media();

        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::Error { kind: ErrorKind::Network, details, .. } if details == "levelLoadError"
        ));
    }

    #[tokio::test]
    async fn test_garbage_manifest_is_other_error() {
        let (mut hls, mut rx) = engine(origin(&[("https://cdn.example.com/v/master.m3u8", 200, "<html/>")]));
        hls.load_source(master_url());
        hls.attach_media();

        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::Error { kind: ErrorKind::Other, fatal: true, details } if details == "manifestParsingError"
        ));
    }

    #[tokio::test]
    async fn test_media_playlist_entry_point() {
        let (mut hls, mut rx) = engine(origin(&[("https://cdn.example.com/v/master.m3u8", 200, LEVEL)]));
        hls.load_source(master_url());
        hls.attach_media();

        match rx.recv().await.unwrap() {
            EngineEvent::ManifestParsed { levels, duration } => {
                assert_eq!(levels.len(), 1);
                assert!(levels[0].resolution.is_none());
                assert_eq!(duration, Some(24.0));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_level_forced_before_load() {
        // Duration always comes from the first level, whatever level starts
        let (mut hls, mut rx) = engine(full_origin());
        hls.set_current_level(Some(1));
        hls.load_source(master_url());
        hls.attach_media();

        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::ManifestParsed { duration: Some(d), .. } if d == 24.0
        ));
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::LevelSwitched { level: 1 });
    }

    #[tokio::test]
    async fn test_destroy_silences_engine() {
        let (mut hls, mut rx) = engine(full_origin());
        hls.load_source(master_url());
        hls.attach_media();
        rx.recv().await.unwrap();
        rx.recv().await.unwrap();

        hls.destroy();
        hls.set_current_level(Some(2));
        hls.start_load();
        hls.recover_media_error();
        hls.report_download(1_000_000, Duration::from_secs(1));

        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(hls.media_recoveries(), 0);
    }
}
