//! Mounted player component
//!
//! [`Player::mount`] spawns one task that owns the controller and the
//! control surface. Intents, media/engine events, verification results and
//! timers are all handled on that task, so state has a single writer.
//! Observers read published [`PlayerSnapshot`]s from a watch channel.

use crate::{
    controller::{ControllerDeps, PlaybackController},
    state::PlayerState,
    surface::{ControlSurface, UiState},
    types::{PlaybackRate, QualitySelection, SessionId},
    view::ControlsView,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// User intent issued by the control surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    TogglePlayPause,
    /// Click on the video itself: toggle and flash the icon
    SurfaceClicked,
    /// 0-100
    Seek(f64),
    StepBackward,
    StepForward,
    /// 0-1
    SetVolume(f64),
    ToggleMute,
    SetPlaybackRate(PlaybackRate),
    /// Level index, or -1 for automatic selection
    SetQuality(i64),
    ToggleFullscreen,
    TogglePip,
    PointerMoved,
    PointerLeft,
    VolumeHover(bool),
    ToggleSettingsMenu,
    ToggleQualityMenu,
}

enum Command {
    Intent(Intent),
    ChangeVideo(String),
    Unmount,
}

/// Published state of a mounted player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub player: PlayerState,
    pub ui: UiState,
    pub pip_enabled: bool,
}

impl PlayerSnapshot {
    pub fn view(&self) -> ControlsView {
        ControlsView::render(&self.player, &self.ui, self.pip_enabled)
    }
}

/// Player component entry point
pub struct Player;

impl Player {
    /// Mount a player for `video_id` and start loading it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(deps: ControllerDeps, video_id: impl Into<String>) -> PlayerHandle {
        let video_id = video_id.into();
        let surface = ControlSurface::new(deps.config.controls_hide_delay(), deps.config.flash_duration());
        let mut controller = PlaybackController::new(deps);
        let session_id = controller.session_id();

        info!(%session_id, %video_id, "Mounting player");
        controller.load(&video_id);

        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot(&controller, &surface));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(controller, surface, command_rx, snapshot_tx));

        PlayerHandle {
            session_id,
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }
}

/// Handle to a mounted player. Dropping it unmounts the player.
pub struct PlayerHandle {
    session_id: SessionId,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<PlayerSnapshot>,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        self.commands
            .send(Command::Intent(intent))
            .map_err(|_| Error::PlayerGone)
    }

    /// Tear down the current session and load another video
    pub fn change_video(&self, video_id: impl Into<String>) -> Result<()> {
        self.commands
            .send(Command::ChangeVideo(video_id.into()))
            .map_err(|_| Error::PlayerGone)
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Release the engine, cancel timers and wait for the player task to end
    pub async fn unmount(self) -> Result<()> {
        let _ = self.commands.send(Command::Unmount);
        self.task.await.map_err(|e| Error::Internal(e.to_string()))
    }
}

fn snapshot(controller: &PlaybackController, surface: &ControlSurface) -> PlayerSnapshot {
    PlayerSnapshot {
        player: controller.state().clone(),
        ui: surface.ui().clone(),
        pip_enabled: controller.pip_enabled(),
    }
}

async fn run(
    mut controller: PlaybackController,
    mut surface: ControlSurface,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<PlayerSnapshot>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Intent(intent)) => {
                    apply_intent(&mut controller, &mut surface, intent).await;
                }
                Some(Command::ChangeVideo(video_id)) => {
                    controller.load(&video_id);
                }
                Some(Command::Unmount) | None => break,
            },
            event = controller.next_event() => {
                controller.handle(event).await;
            }
            timer = surface.next_timer() => {
                surface.on_timer(timer);
            }
        }

        let next = snapshot(&controller, &surface);
        snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    controller.unmount();
    surface.unmount();
    debug!(session_id = %controller.session_id(), "Player task finished");
}

async fn apply_intent(controller: &mut PlaybackController, surface: &mut ControlSurface, intent: Intent) {
    debug!(?intent, "Intent");

    match intent {
        Intent::TogglePlayPause => controller.toggle_play_pause().await,
        Intent::SurfaceClicked => {
            surface.flash();
            controller.toggle_play_pause().await;
        }
        Intent::Seek(percent) => controller.seek(percent),
        Intent::StepBackward => controller.step_backward(),
        Intent::StepForward => controller.step_forward(),
        Intent::SetVolume(volume) => controller.set_volume(volume),
        Intent::ToggleMute => controller.toggle_mute(),
        Intent::SetPlaybackRate(rate) => controller.set_playback_rate(rate),
        Intent::SetQuality(index) => {
            match QualitySelection::from_index(index).and_then(|s| controller.set_quality(s)) {
                Ok(()) => surface.quality_chosen(),
                Err(e) => warn!(index, error = %e, "Quality change rejected"),
            }
        }
        Intent::ToggleFullscreen => controller.toggle_fullscreen().await,
        Intent::TogglePip => controller.toggle_pip().await,
        Intent::PointerMoved => surface.pointer_moved(),
        Intent::PointerLeft => surface.pointer_left(),
        Intent::VolumeHover(hovered) => surface.set_volume_hover(hovered),
        Intent::ToggleSettingsMenu => surface.toggle_settings_menu(),
        Intent::ToggleQualityMenu => surface.toggle_quality_menu(),
    }
}
