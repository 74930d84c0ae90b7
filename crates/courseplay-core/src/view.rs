//! Render model of the control surface
//!
//! What a front end needs to draw the player controls, derived from
//! [`PlayerState`] and [`UiState`] without any playback logic of its own.

use crate::{
    state::PlayerState,
    surface::UiState,
    types::{CurrentQuality, PlaybackRate, VolumeIcon},
};
use serde::Serialize;

/// Step of the volume range input
pub const VOLUME_STEP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateOption {
    pub value: f64,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityOption {
    /// Index passed to set-quality; -1 for auto
    pub index: i64,
    pub label: String,
    pub active: bool,
}

/// Everything the control bar renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsView {
    pub play_label: &'static str,
    /// Seek range input value, 0-100
    pub seek_value: f64,
    pub current_time: String,
    pub duration: String,
    pub volume_value: f64,
    pub volume_step: f64,
    pub volume_icon: VolumeIcon,
    pub rates: Vec<RateOption>,
    pub quality_label: String,
    pub qualities: Vec<QualityOption>,
    pub pip_disabled: bool,
    pub error: Option<String>,
    pub show_controls: bool,
    pub show_volume_slider: bool,
    pub show_settings_menu: bool,
    pub show_quality_menu: bool,
    pub show_flash: bool,
}

impl ControlsView {
    pub fn render(player: &PlayerState, ui: &UiState, pip_enabled: bool) -> Self {
        let rates = PlaybackRate::ALL
            .iter()
            .map(|rate| RateOption {
                value: rate.as_f64(),
                label: rate.to_string(),
                selected: (rate.as_f64() - player.playback_rate).abs() < f64::EPSILON,
            })
            .collect();

        let mut qualities = vec![QualityOption {
            index: -1,
            label: "Auto".to_string(),
            active: player.current_quality == CurrentQuality::Auto,
        }];
        qualities.extend(player.available_qualities.iter().map(|q| QualityOption {
            index: q.id as i64,
            label: q.name.clone(),
            active: player.current_quality == q.name.as_str(),
        }));

        Self {
            play_label: if player.is_playing { "Pause" } else { "Play" },
            seek_value: player.progress,
            current_time: format_time(player.current_time),
            duration: format_time(player.duration),
            volume_value: player.volume,
            volume_step: VOLUME_STEP,
            volume_icon: player.volume_icon(),
            rates,
            quality_label: player.current_quality.to_string(),
            qualities,
            pip_disabled: !pip_enabled,
            error: player.error.clone(),
            show_controls: ui.show_controls,
            show_volume_slider: ui.show_volume_slider,
            show_settings_menu: ui.show_settings_menu,
            show_quality_menu: ui.show_quality_menu,
            show_flash: ui.show_flash,
        }
    }
}

/// `m:ss`; unknown or non-positive times render as `0:00`
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
