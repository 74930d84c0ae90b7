//! Control surface UI state
//!
//! Transient visibility state (control bar, volume slider, menus, flash
//! icon) driven by pointer activity and timers. Holds no playback
//! authority: intents are forwarded to the controller by the player task.

use crate::timer::Deadline;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Visibility flags of the control surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    pub show_controls: bool,
    pub show_volume_slider: bool,
    pub show_settings_menu: bool,
    pub show_quality_menu: bool,
    /// Play/pause icon flashed over the video after a click
    pub show_flash: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_controls: true,
            show_volume_slider: false,
            show_settings_menu: false,
            show_quality_menu: false,
            show_flash: false,
        }
    }
}

impl UiState {
    pub fn menu_open(&self) -> bool {
        self.show_settings_menu || self.show_quality_menu
    }
}

/// Which surface timer fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTimer {
    HideControls,
    ClearFlash,
}

/// Control surface state machine with its two timers
#[derive(Debug)]
pub struct ControlSurface {
    ui: UiState,
    hide_delay: Duration,
    flash_duration: Duration,
    hide: Deadline,
    flash: Deadline,
}

impl ControlSurface {
    pub fn new(hide_delay: Duration, flash_duration: Duration) -> Self {
        Self {
            ui: UiState::default(),
            hide_delay,
            flash_duration,
            hide: Deadline::new(),
            flash: Deadline::new(),
        }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Show controls and restart the inactivity timer
    pub fn pointer_moved(&mut self) {
        self.ui.show_controls = true;
        self.hide.arm(self.hide_delay);
    }

    pub fn pointer_left(&mut self) {
        self.hide.cancel();
        self.ui.show_controls = false;
        self.ui.show_volume_slider = false;
    }

    /// Flash the play/pause icon for the configured duration
    pub fn flash(&mut self) {
        self.ui.show_flash = true;
        self.flash.arm(self.flash_duration);
    }

    pub fn set_volume_hover(&mut self, hovered: bool) {
        self.ui.show_volume_slider = hovered;
    }

    /// Opening the settings menu closes the quality menu
    pub fn toggle_settings_menu(&mut self) {
        self.ui.show_settings_menu = !self.ui.show_settings_menu;
        if self.ui.show_settings_menu {
            self.ui.show_quality_menu = false;
        }
    }

    /// Opening the quality menu closes the settings menu
    pub fn toggle_quality_menu(&mut self) {
        self.ui.show_quality_menu = !self.ui.show_quality_menu;
        if self.ui.show_quality_menu {
            self.ui.show_settings_menu = false;
        }
    }

    pub fn quality_chosen(&mut self) {
        self.ui.show_quality_menu = false;
    }

    /// Wait for either timer. Cancel safe; pending while both are disarmed.
    pub async fn next_timer(&mut self) -> SurfaceTimer {
        let Self { hide, flash, .. } = self;
        tokio::select! {
            _ = hide.fired() => SurfaceTimer::HideControls,
            _ = flash.fired() => SurfaceTimer::ClearFlash,
        }
    }

    pub fn on_timer(&mut self, timer: SurfaceTimer) {
        match timer {
            SurfaceTimer::HideControls => {
                if self.ui.menu_open() {
                    debug!("Menu open, keeping controls visible");
                } else {
                    self.ui.show_controls = false;
                }
            }
            SurfaceTimer::ClearFlash => {
                self.ui.show_flash = false;
            }
        }
    }

    /// Cancel both timers so nothing fires against a released player
    pub fn unmount(&mut self) {
        self.hide.cancel();
        self.flash.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> ControlSurface {
        ControlSurface::new(Duration::from_secs(3), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_hide_after_inactivity() {
        let mut s = surface();
        let start = tokio::time::Instant::now();
        s.pointer_moved();

        let timer = s.next_timer().await;
        assert_eq!(timer, SurfaceTimer::HideControls);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        s.on_timer(timer);
        assert!(!s.ui().show_controls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_menu_keeps_controls() {
        let mut s = surface();
        s.pointer_moved();
        s.toggle_quality_menu();

        let timer = s.next_timer().await;
        s.on_timer(timer);
        assert!(s.ui().show_controls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_clears_first() {
        let mut s = surface();
        s.pointer_moved();
        s.flash();
        assert!(s.ui().show_flash);

        let timer = s.next_timer().await;
        assert_eq!(timer, SurfaceTimer::ClearFlash);
        s.on_timer(timer);
        assert!(!s.ui().show_flash);
        assert!(s.ui().show_controls);
    }

    #[test]
    fn test_menus_are_exclusive() {
        let mut s = surface();
        s.toggle_settings_menu();
        assert!(s.ui().show_settings_menu);

        s.toggle_quality_menu();
        assert!(s.ui().show_quality_menu);
        assert!(!s.ui().show_settings_menu);

        s.toggle_settings_menu();
        assert!(!s.ui().show_quality_menu);

        s.toggle_settings_menu();
        assert!(!s.ui().menu_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_timers() {
        let mut s = surface();
        s.pointer_moved();
        s.flash();
        s.unmount();

        let outcome = tokio::time::timeout(Duration::from_secs(10), s.next_timer()).await;
        assert!(outcome.is_err());
    }
}
