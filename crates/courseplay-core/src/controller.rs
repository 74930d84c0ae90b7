//! Playback controller
//!
//! Single writer of [`PlayerState`]. Owns the streaming engine instance,
//! the manifest verification task and the network reload timer. Play and
//! pause are never set optimistically: the media element's own signals
//! drive those transitions.

use crate::{
    config::PlayerConfig,
    engine::{event_channel, EngineEvent, EngineEventReceiver, EngineFactory, ErrorKind, StreamingEngine},
    error::VerifyError,
    manifest::ManifestVerifier,
    media::{MediaElement, MediaEvent, MediaEventReceiver, PlayError, Platform},
    net::{HttpFetch, HLS_MIME},
    state::{self, Action, PlayerState},
    timer::Deadline,
    types::{CurrentQuality, PlaybackRate, QualityLevel, QualitySelection, SessionId},
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Collaborators handed to a controller at mount time
pub struct ControllerDeps {
    pub config: PlayerConfig,
    pub media: Arc<dyn MediaElement>,
    pub media_events: MediaEventReceiver,
    pub platform: Arc<dyn Platform>,
    pub engines: Arc<dyn EngineFactory>,
    pub fetcher: Arc<dyn HttpFetch>,
}

/// Outcome of a manifest verification task
#[derive(Debug)]
pub struct Verified {
    generation: u64,
    url: Url,
    result: std::result::Result<(), VerifyError>,
}

/// Anything the controller reacts to besides user intents
#[derive(Debug)]
pub enum ControllerEvent {
    Media(MediaEvent),
    Engine(EngineEvent),
    Verified(Verified),
    /// Network retry delay elapsed
    ReloadDue,
}

/// How the current manifest is being played
enum Source {
    None,
    Engine {
        engine: Box<dyn StreamingEngine>,
        events: EngineEventReceiver,
    },
    /// Handed to the media element directly
    Native,
}

impl Source {
    fn kind(&self) -> &'static str {
        match self {
            Source::None => "none",
            Source::Engine { .. } => "engine",
            Source::Native => "native",
        }
    }
}

async fn next_engine_event(source: &mut Source) -> Option<EngineEvent> {
    match source {
        Source::Engine { events, .. } => events.recv().await,
        _ => std::future::pending().await,
    }
}

/// Playback controller for one mounted player
pub struct PlaybackController {
    session_id: SessionId,
    config: PlayerConfig,
    media: Arc<dyn MediaElement>,
    media_events: MediaEventReceiver,
    platform: Arc<dyn Platform>,
    engines: Arc<dyn EngineFactory>,
    fetcher: Arc<dyn HttpFetch>,
    state: PlayerState,
    source: Source,
    video_id: Option<String>,
    /// Bumped on every load and on unmount; older verification results are stale
    generation: u64,
    verify_tx: mpsc::UnboundedSender<Verified>,
    verify_rx: mpsc::UnboundedReceiver<Verified>,
    reload: Deadline,
}

impl PlaybackController {
    pub fn new(deps: ControllerDeps) -> Self {
        let ControllerDeps {
            config,
            media,
            media_events,
            platform,
            engines,
            fetcher,
        } = deps;

        let mut state = PlayerState::default();
        state.apply(Action::VolumeChanged {
            volume: media.volume(),
            muted: media.is_muted(),
        });
        state.apply(Action::RateChanged(media.playback_rate()));
        state.apply(Action::FullscreenChanged(platform.is_fullscreen()));
        state.apply(Action::PipChanged(platform.is_pip()));

        let (verify_tx, verify_rx) = mpsc::unbounded_channel();

        Self {
            session_id: SessionId::new(),
            config,
            media,
            media_events,
            platform,
            engines,
            fetcher,
            state,
            source: Source::None,
            video_id: None,
            generation: 0,
            verify_tx,
            verify_rx,
            reload: Deadline::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    /// Whether picture-in-picture can be requested on this host
    pub fn pip_enabled(&self) -> bool {
        self.platform.pip_enabled()
    }

    /// Start a session for `video_id`, tearing down any previous one first.
    ///
    /// Verification runs in the background; its result arrives through
    /// [`next_event`](Self::next_event).
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub fn load(&mut self, video_id: &str) {
        self.teardown();
        self.generation += 1;
        self.video_id = Some(video_id.to_string());
        self.state.apply(Action::Reset);
        self.state.apply(Action::LoadStarted);

        let url = match self.config.manifest_url(video_id) {
            Ok(url) => url,
            Err(e) => {
                self.fail(e.user_message());
                return;
            }
        };

        info!(url = %url, generation = self.generation, "Verifying manifest");

        let verifier = ManifestVerifier::from_config(self.fetcher.clone(), &self.config);
        let tx = self.verify_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = verifier.verify(&url).await;
            // Controller gone: nothing to report to
            let _ = tx.send(Verified {
                generation,
                url,
                result,
            });
        });
    }

    /// Release the engine, cancel timers and ignore any verification still in flight
    pub fn unmount(&mut self) {
        self.teardown();
        self.generation += 1;
        info!(session_id = %self.session_id, "Player unmounted");
    }

    /// Wait for the next media, engine, verification or timer event.
    ///
    /// Cancel safe.
    pub async fn next_event(&mut self) -> ControllerEvent {
        let Self {
            media_events,
            source,
            verify_rx,
            reload,
            ..
        } = self;

        tokio::select! {
            Some(event) = media_events.recv() => ControllerEvent::Media(event),
            Some(event) = next_engine_event(source) => ControllerEvent::Engine(event),
            Some(verified) = verify_rx.recv() => ControllerEvent::Verified(verified),
            _ = reload.fired() => ControllerEvent::ReloadDue,
        }
    }

    pub async fn handle(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Media(event) => self.handle_media(event).await,
            ControllerEvent::Engine(event) => self.handle_engine(event).await,
            ControllerEvent::Verified(verified) => self.handle_verified(verified),
            ControllerEvent::ReloadDue => {
                if let Source::Engine { engine, .. } = &mut self.source {
                    info!("Reloading manifest after network error");
                    engine.start_load();
                }
            }
        }
    }

    #[instrument(skip(self, verified), fields(session_id = %self.session_id, generation = verified.generation))]
    fn handle_verified(&mut self, verified: Verified) {
        if verified.generation != self.generation {
            debug!(current = self.generation, "Dropping stale verification result");
            return;
        }

        match verified.result {
            Ok(()) => self.attach(verified.url),
            Err(e) => {
                warn!(error = %e, "Manifest verification failed");
                self.state.apply(Action::Fatal(Error::from(e).user_message()));
            }
        }
    }

    fn attach(&mut self, url: Url) {
        // Never two engines on one media element
        self.teardown();

        if self.engines.is_supported() {
            let (tx, rx) = event_channel();
            match self.engines.create(&self.config.engine, tx) {
                Ok(mut engine) => {
                    engine.load_source(url);
                    engine.attach_media();
                    self.source = Source::Engine { engine, events: rx };
                    info!("Streaming engine attached");
                }
                Err(e) => self.fail(e.user_message()),
            }
        } else if self.media.can_play_type(HLS_MIME) {
            self.media.set_source(&url);
            self.source = Source::Native;
            info!("Using native HLS playback");
        } else {
            warn!("No HLS playback path available");
            self.fail(Error::UnsupportedFormat.user_message());
        }
    }

    fn teardown(&mut self) {
        self.reload.cancel();
        match std::mem::replace(&mut self.source, Source::None) {
            Source::Engine { mut engine, events } => {
                engine.destroy();
                // Dropping the receiver detaches every listener
                drop(events);
                info!("Streaming engine released");
            }
            Source::Native => debug!("Native source released"),
            Source::None => {}
        }
    }

    fn fail(&mut self, message: String) {
        self.teardown();
        self.state.apply(Action::Fatal(message));
    }

    /// Play; if refused, retry once muted; if still refused, ask for a click
    async fn autoplay(&mut self) {
        let Err(first) = self.media.play().await else {
            return;
        };
        debug!(error = %first, "Autoplay rejected, retrying muted");
        self.media.set_muted(true);

        if let Err(second) = self.media.play().await {
            warn!(error = %second, "Muted autoplay rejected");
            self.state.apply(Action::Notice(state::AUTOPLAY_BLOCKED.to_string()));
        }
    }

    async fn handle_engine(&mut self, event: EngineEvent) {
        debug!(?event, "Engine event");

        match event {
            EngineEvent::ManifestParsed { levels, duration } => {
                let qualities = levels
                    .iter()
                    .enumerate()
                    .map(|(i, level)| QualityLevel::new(i, level.resolution, level.bandwidth))
                    .collect();
                self.state.apply(Action::ManifestParsed { qualities, duration });
                self.autoplay().await;
            }
            EngineEvent::LevelSwitched { level } => {
                let quality = match self.state.quality_name(level) {
                    Some(name) => CurrentQuality::Named(name.to_string()),
                    None => CurrentQuality::Auto,
                };
                self.state.apply(Action::QualityChanged(quality));
            }
            EngineEvent::Error { fatal: false, details, .. } => {
                debug!(%details, "Non-fatal engine error");
            }
            EngineEvent::Error { kind, details, .. } => match kind {
                ErrorKind::Network => {
                    warn!(%details, delay_ms = self.config.network_retry_delay_ms, "Fatal network error, scheduling reload");
                    self.state.apply(Action::Recovering(state::NETWORK_RECOVERING.to_string()));
                    self.reload.arm(self.config.network_retry_delay());
                }
                ErrorKind::Media => {
                    warn!(%details, "Fatal media error, recovering in place");
                    if let Source::Engine { engine, .. } = &mut self.source {
                        engine.recover_media_error();
                    }
                    self.state.apply(Action::Recovering(state::MEDIA_RECOVERING.to_string()));
                }
                ErrorKind::Other => {
                    warn!(%details, "Fatal engine error, tearing down");
                    self.fail(state::playback_error(&details));
                }
            },
        }
    }

    async fn handle_media(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::Play => {
                self.state.apply(Action::Played);
            }
            MediaEvent::Pause => {
                self.state.apply(Action::Paused);
            }
            MediaEvent::TimeUpdate {
                current_time,
                duration,
            } => {
                self.state.apply(Action::TimeUpdated {
                    current_time,
                    duration,
                });
            }
            MediaEvent::VolumeChange { volume, muted } => {
                self.state.apply(Action::VolumeChanged { volume, muted });
            }
            MediaEvent::RateChange { rate } => {
                self.state.apply(Action::RateChanged(rate));
            }
            MediaEvent::LoadedMetadata { duration } => {
                self.state.apply(Action::MetadataLoaded { duration });
                if matches!(self.source, Source::Native) {
                    self.autoplay().await;
                }
            }
            MediaEvent::Error { message } => {
                warn!(?message, source = self.source.kind(), "Media element error");
                self.state.apply(Action::Notice(state::video_error(message.as_deref())));
            }
        }
    }

    /// Pause if playing, otherwise request playback
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn toggle_play_pause(&mut self) {
        if matches!(self.source, Source::None) {
            debug!(phase = %self.state.phase, "Nothing to play");
            return;
        }
        if !self.media.is_paused() {
            self.media.pause();
            return;
        }

        match self.media.play().await {
            Ok(()) => {
                self.state.apply(Action::ClearNotice);
            }
            Err(PlayError::NotAllowed(reason)) => {
                debug!(%reason, "Play not allowed, retrying muted");
                self.media.set_muted(true);
                if let Err(e) = self.media.play().await {
                    warn!(error = %e, "Muted play rejected");
                    self.state.apply(Action::Notice(state::AUTOPLAY_BLOCKED.to_string()));
                }
            }
            Err(PlayError::Other(message)) => {
                warn!(%message, "Play failed");
                self.state.apply(Action::Notice(message));
            }
        }
    }

    fn known_duration(&self) -> Option<f64> {
        self.media.duration().filter(|d| d.is_finite() && *d > 0.0)
    }

    /// Seek to `percent` (0-100) of the duration; no-op while the duration is unknown
    pub fn seek(&mut self, percent: f64) {
        let Some(duration) = self.known_duration() else {
            debug!(percent, "Seek ignored, duration unknown");
            return;
        };
        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
        self.media.set_current_time(percent / 100.0 * duration);
    }

    /// Jump back by the configured step
    pub fn step_backward(&mut self) {
        self.step(-self.config.seek_step_secs);
    }

    /// Jump forward by the configured step
    pub fn step_forward(&mut self) {
        self.step(self.config.seek_step_secs);
    }

    fn step(&mut self, delta: f64) {
        let Some(duration) = self.known_duration() else {
            debug!(delta, "Step ignored, duration unknown");
            return;
        };
        let target = (self.media.current_time() + delta).clamp(0.0, duration);
        self.media.set_current_time(target);
    }

    /// Set volume (0-1). Zero also mutes; nonzero never unmutes.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { 0.0 };
        self.media.set_volume(volume);
        if volume == 0.0 {
            self.media.set_muted(true);
        }
    }

    pub fn toggle_mute(&mut self) {
        self.media.set_muted(!self.media.is_muted());
    }

    pub fn set_playback_rate(&mut self, rate: PlaybackRate) {
        self.media.set_playback_rate(rate.as_f64());
    }

    /// Force a quality level or return to automatic selection.
    ///
    /// Only meaningful while the streaming engine drives playback.
    pub fn set_quality(&mut self, selection: QualitySelection) -> Result<()> {
        let Source::Engine { engine, .. } = &mut self.source else {
            debug!(?selection, "No streaming engine, quality unchanged");
            return Ok(());
        };

        let quality = match selection {
            QualitySelection::Auto => CurrentQuality::Auto,
            QualitySelection::Level(index) => match self.state.quality_name(index) {
                Some(name) => CurrentQuality::Named(name.to_string()),
                None => return Err(Error::InvalidQuality(index as i64)),
            },
        };

        info!(%quality, "Quality selected");
        engine.set_current_level(selection.level());
        self.state.apply(Action::QualityChanged(quality));
        Ok(())
    }

    pub async fn toggle_fullscreen(&mut self) {
        let enter = !self.platform.is_fullscreen();
        self.set_fullscreen(enter).await;
    }

    /// Enter or leave fullscreen; a rejection only produces a notice
    pub async fn set_fullscreen(&mut self, on: bool) {
        if self.platform.is_fullscreen() == on {
            self.state.apply(Action::FullscreenChanged(on));
            return;
        }

        let result = if on {
            self.platform.request_fullscreen().await
        } else {
            self.platform.exit_fullscreen().await
        };

        match result {
            Ok(()) => {
                self.state.apply(Action::FullscreenChanged(on));
            }
            Err(e) => {
                warn!(error = %e, on, "Fullscreen request rejected");
                self.state.apply(Action::Notice(state::FULLSCREEN_UNAVAILABLE.to_string()));
            }
        }
    }

    pub async fn toggle_pip(&mut self) {
        let enter = !self.platform.is_pip();
        self.set_pip(enter).await;
    }

    /// Enter or leave picture-in-picture; a rejection only produces a notice
    pub async fn set_pip(&mut self, on: bool) {
        if self.platform.is_pip() == on {
            self.state.apply(Action::PipChanged(on));
            return;
        }
        if on && !self.platform.pip_enabled() {
            self.state.apply(Action::Notice(state::PIP_UNAVAILABLE.to_string()));
            return;
        }

        let result = if on {
            self.platform.request_pip().await
        } else {
            self.platform.exit_pip().await
        };

        match result {
            Ok(()) => {
                self.state.apply(Action::PipChanged(on));
            }
            Err(e) => {
                warn!(error = %e, on, "Picture-in-Picture request rejected");
                self.state.apply(Action::Notice(state::PIP_UNAVAILABLE.to_string()));
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, EngineEventSender, NativeOnly};
    use crate::media::{AutoplayPolicy, HeadlessMedia, HeadlessPlatform};
    use crate::net::{FetchError, FetchResponse, RequestKind};
    use crate::types::PlaybackPhase;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct StaticOrigin {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl HttpFetch for StaticOrigin {
        async fn get(&self, _url: &Url, _kind: RequestKind) -> std::result::Result<FetchResponse, FetchError> {
            Ok(FetchResponse::new(self.status, self.body))
        }
    }

    /// Records calls; emits nothing by itself
    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    struct RecordingEngine(Arc<Calls>);

    impl StreamingEngine for RecordingEngine {
        fn load_source(&mut self, url: Url) {
            self.0 .0.lock().unwrap().push(format!("load_source {url}"));
        }
        fn attach_media(&mut self) {
            self.0 .0.lock().unwrap().push("attach_media".into());
        }
        fn start_load(&mut self) {
            self.0 .0.lock().unwrap().push("start_load".into());
        }
        fn recover_media_error(&mut self) {
            self.0 .0.lock().unwrap().push("recover_media_error".into());
        }
        fn set_current_level(&mut self, level: Option<usize>) {
            self.0 .0.lock().unwrap().push(format!("set_current_level {level:?}"));
        }
        fn current_level(&self) -> Option<usize> {
            None
        }
        fn destroy(&mut self) {
            self.0 .0.lock().unwrap().push("destroy".into());
        }
    }

    #[derive(Default)]
    struct RecordingFactory {
        calls: Arc<Calls>,
        senders: Mutex<Vec<EngineEventSender>>,
    }

    impl EngineFactory for RecordingFactory {
        fn is_supported(&self) -> bool {
            true
        }
        fn create(&self, _config: &EngineConfig, events: EngineEventSender) -> Result<Box<dyn StreamingEngine>> {
            self.senders.lock().unwrap().push(events);
            Ok(Box::new(RecordingEngine(self.calls.clone())))
        }
    }

    fn controller(
        engines: Arc<dyn EngineFactory>,
        media: Arc<HeadlessMedia>,
        media_events: MediaEventReceiver,
        origin: StaticOrigin,
    ) -> PlaybackController {
        PlaybackController::new(ControllerDeps {
            config: PlayerConfig::default(),
            media,
            media_events,
            platform: Arc::new(HeadlessPlatform::new(false, false)),
            engines,
            fetcher: Arc::new(origin),
        })
    }

    async fn pump_until<P: Fn(&PlaybackController) -> bool>(ctl: &mut PlaybackController, done: P) {
        for _ in 0..32 {
            if done(ctl) {
                return;
            }
            let event = ctl.next_event().await;
            ctl.handle(event).await;
        }
        panic!("condition not reached");
    }

    fn ok_origin() -> StaticOrigin {
        StaticOrigin {
            status: 200,
            body: "#EXTM3U\n",
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_verified_manifest_attaches_engine() {
        let factory = Arc::new(RecordingFactory::default());
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(factory.clone(), media, rx, ok_origin());

        ctl.load("abc");
        assert_eq!(ctl.state().phase, PlaybackPhase::Loading);
        pump_until(&mut ctl, |c| matches!(c.source, Source::Engine { .. })).await;

        let calls = factory.calls.0.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "load_source http://localhost:3000/api/videos/stream/abc/master.m3u8".to_string(),
                "attach_media".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_fatal_after_retries() {
        let factory = Arc::new(RecordingFactory::default());
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(factory.clone(), media, rx, StaticOrigin { status: 404, body: "" });

        let start = tokio::time::Instant::now();
        ctl.load("missing");
        pump_until(&mut ctl, |c| c.state().phase == PlaybackPhase::Failed).await;

        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert_eq!(ctl.state().error.as_deref(), Some("Video not found on server"));
        assert!(factory.calls.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_fallback_sets_source() {
        let (media, rx) = HeadlessMedia::native(AutoplayPolicy::Allowed);
        let mut ctl = controller(Arc::new(NativeOnly), media.clone(), rx, ok_origin());

        ctl.load("abc");
        pump_until(&mut ctl, |c| matches!(c.source, Source::Native)).await;
        assert!(media.source().is_some());

        media.load_metadata(90.0);
        pump_until(&mut ctl, |c| c.state().is_playing).await;
        assert_eq!(ctl.state().duration, 90.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_playback_path_is_unsupported() {
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(Arc::new(NativeOnly), media, rx, ok_origin());

        ctl.load("abc");
        pump_until(&mut ctl, |c| c.state().phase == PlaybackPhase::Failed).await;
        assert_eq!(
            ctl.state().error.as_deref(),
            Some("Your browser doesn't support HLS streaming")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_replaces_engine() {
        let factory = Arc::new(RecordingFactory::default());
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(factory.clone(), media, rx, ok_origin());

        ctl.load("first");
        pump_until(&mut ctl, |c| matches!(c.source, Source::Engine { .. })).await;
        ctl.load("second");
        assert!(matches!(ctl.source, Source::None));
        pump_until(&mut ctl, |c| matches!(c.source, Source::Engine { .. })).await;

        let calls = factory.calls.0.lock().unwrap().clone();
        let destroy = calls.iter().position(|c| c == "destroy").unwrap();
        let second_load = calls.iter().rposition(|c| c.starts_with("load_source")).unwrap();
        assert!(destroy < second_load);
        assert_eq!(ctl.video_id(), Some("second"));
    }

    #[tokio::test]
    async fn test_volume_zero_mutes_and_nonzero_keeps_mute() {
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(Arc::new(NativeOnly), media.clone(), rx, ok_origin());

        ctl.set_volume(0.0);
        assert!(media.is_muted());
        ctl.set_volume(0.6);
        assert!(media.is_muted());
        assert_eq!(media.volume(), 0.6);

        ctl.toggle_mute();
        assert!(!media.is_muted());
    }

    #[tokio::test]
    async fn test_platform_rejection_is_scoped() {
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(Arc::new(NativeOnly), media, rx, ok_origin());

        ctl.toggle_fullscreen().await;
        assert_eq!(ctl.state().error.as_deref(), Some("Fullscreen not available"));
        assert!(!ctl.state().is_fullscreen);

        ctl.toggle_pip().await;
        assert_eq!(ctl.state().error.as_deref(), Some("Picture-in-Picture not available"));
        assert!(!ctl.state().is_pip);
    }

    #[tokio::test]
    async fn test_repeated_fullscreen_and_pip_requests_settle() {
        let (media, media_events) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = PlaybackController::new(ControllerDeps {
            config: PlayerConfig::default(),
            media,
            media_events,
            platform: Arc::new(HeadlessPlatform::default()),
            engines: Arc::new(NativeOnly),
            fetcher: Arc::new(ok_origin()),
        });

        // Leaving a mode that is not active asks nothing of the platform
        ctl.set_fullscreen(false).await;
        ctl.set_pip(false).await;
        assert!(ctl.state().error.is_none());

        ctl.set_fullscreen(true).await;
        ctl.set_fullscreen(true).await;
        assert!(ctl.state().is_fullscreen);
        ctl.set_pip(true).await;
        ctl.set_pip(true).await;
        assert!(ctl.state().is_pip);
        assert!(ctl.state().error.is_none());

        ctl.set_fullscreen(false).await;
        ctl.set_fullscreen(false).await;
        ctl.set_pip(false).await;
        ctl.set_pip(false).await;
        assert!(!ctl.state().is_fullscreen);
        assert!(!ctl.state().is_pip);
        assert!(ctl.state().error.is_none());
    }

    #[tokio::test]
    async fn test_set_quality_without_engine_is_noop() {
        let (media, rx) = HeadlessMedia::new(AutoplayPolicy::Allowed);
        let mut ctl = controller(Arc::new(NativeOnly), media, rx, ok_origin());
        assert!(ctl.set_quality(QualitySelection::Level(3)).is_ok());
        assert_eq!(ctl.state().current_quality, CurrentQuality::Auto);
    }
}
