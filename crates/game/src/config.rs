//! Bench configuration. Loaded from config.ron at startup.
//!
//! Every section and field has a serde default, so a config file only needs
//! to name what it changes.

use interaction::{ManipulationConfig, PlacementConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persistent settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub manipulation: ManipulationConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub gearbox: GearboxConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub toggle: ToggleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    #[serde(default = "default_window_width")]
    pub width: u32,
    /// Window height in logical pixels.
    #[serde(default = "default_window_height")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub vsync: bool,
    #[serde(default)]
    pub fullscreen: bool,
}

fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            vsync: true,
            fullscreen: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Horizontal speed in m/s.
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Q/E speed in m/s.
    #[serde(default = "default_move_speed")]
    pub vertical_speed: f32,
    /// Without fly mode Q/E do nothing and the eye height stays fixed.
    #[serde(default = "default_true")]
    pub fly_mode: bool,
    /// Mouse sensitivity multiplier (1.0 = 0.001 rad per pixel).
    #[serde(default = "default_mouse_sensitivity")]
    pub mouse_sensitivity: f32,
    #[serde(default = "default_start_position")]
    pub start_position: [f32; 3],
    /// Initial yaw and pitch in degrees.
    #[serde(default = "default_start_look")]
    pub start_look: [f32; 2],
    #[serde(default = "default_true")]
    pub lock_cursor_on_start: bool,
}

fn default_move_speed() -> f32 {
    5.0
}
fn default_mouse_sensitivity() -> f32 {
    2.0
}
fn default_start_position() -> [f32; 3] {
    [0.0, 1.6, 2.2]
}
fn default_start_look() -> [f32; 2] {
    [0.0, -20.0]
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            vertical_speed: default_move_speed(),
            fly_mode: true,
            mouse_sensitivity: default_mouse_sensitivity(),
            start_position: default_start_position(),
            start_look: default_start_look(),
            lock_cursor_on_start: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GearboxConfig {
    /// Screw speed in RPM.
    #[serde(default = "default_screw_rpm")]
    pub screw_rpm: f32,
    /// Gear 1 speed relative to the screw (magnitude).
    #[serde(default = "default_ratio")]
    pub ratio_screw_to_gear1: f32,
    /// Gear 2 speed relative to gear 1 (magnitude).
    #[serde(default = "default_ratio")]
    pub ratio_gear1_to_gear2: f32,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub start_running: bool,
}

fn default_screw_rpm() -> f32 {
    60.0
}
fn default_ratio() -> f32 {
    1.0
}

impl Default for GearboxConfig {
    fn default() -> Self {
        Self {
            screw_rpm: default_screw_rpm(),
            ratio_screw_to_gear1: default_ratio(),
            ratio_gear1_to_gear2: default_ratio(),
            reverse: false,
            start_running: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Reach of cursor clicks on panel controls.
    #[serde(default = "default_click_distance")]
    pub max_click_distance: f32,
    /// Plunger travel when pressed.
    #[serde(default = "default_press_depth")]
    pub press_depth: f32,
    #[serde(default = "default_press_speed")]
    pub press_speed: f32,
    /// Start and stop stay dark and ignore stop clicks until the first start.
    #[serde(default = "default_true")]
    pub start_inactive_until_start_click: bool,
    #[serde(default = "default_flash_seconds")]
    pub reset_flash_seconds: f32,
    #[serde(default)]
    pub knob: KnobConfig,
    #[serde(default)]
    pub switch: SwitchConfig,
}

fn default_click_distance() -> f32 {
    10.0
}
fn default_press_depth() -> f32 {
    0.010
}
fn default_press_speed() -> f32 {
    18.0
}
fn default_flash_seconds() -> f32 {
    0.25
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            max_click_distance: default_click_distance(),
            press_depth: default_press_depth(),
            press_speed: default_press_speed(),
            start_inactive_until_start_click: true,
            reset_flash_seconds: default_flash_seconds(),
            knob: KnobConfig::default(),
            switch: SwitchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnobConfig {
    /// Degrees of rotation per pixel of horizontal drag.
    #[serde(default = "default_rotate_sensitivity")]
    pub rotate_sensitivity: f32,
    #[serde(default = "default_min_angle")]
    pub min_angle: f32,
    #[serde(default = "default_max_angle")]
    pub max_angle: f32,
    #[serde(default)]
    pub min_rpm: f32,
    #[serde(default = "default_max_rpm")]
    pub max_rpm: f32,
    #[serde(default = "default_true")]
    pub only_when_running: bool,
}

fn default_rotate_sensitivity() -> f32 {
    0.25
}
fn default_min_angle() -> f32 {
    -135.0
}
fn default_max_angle() -> f32 {
    135.0
}
fn default_max_rpm() -> f32 {
    1000.0
}

impl Default for KnobConfig {
    fn default() -> Self {
        Self {
            rotate_sensitivity: default_rotate_sensitivity(),
            min_angle: default_min_angle(),
            max_angle: default_max_angle(),
            min_rpm: 0.0,
            max_rpm: default_max_rpm(),
            only_when_running: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Lever tilt in degrees for forward drive.
    #[serde(default = "default_forward_angle")]
    pub forward_angle: f32,
    #[serde(default = "default_reverse_angle")]
    pub reverse_angle: f32,
    #[serde(default = "default_lever_speed")]
    pub lever_lerp_speed: f32,
}

fn default_forward_angle() -> f32 {
    -25.0
}
fn default_reverse_angle() -> f32 {
    25.0
}
fn default_lever_speed() -> f32 {
    16.0
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            forward_angle: default_forward_angle(),
            reverse_angle: default_reverse_angle(),
            lever_lerp_speed: default_lever_speed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub rpm_min: f32,
    #[serde(default = "default_rpm_green_max")]
    pub rpm_green_max: f32,
    #[serde(default = "default_rpm_yellow_max")]
    pub rpm_yellow_max: f32,
    #[serde(default = "default_max_rpm")]
    pub rpm_max: f32,
    /// Keep readouts at zero after the very first start until the knob moves.
    #[serde(default = "default_true")]
    pub zero_until_knob_moves: bool,
    /// Set-point change (RPM) that counts as moving the knob.
    #[serde(default = "default_knob_threshold")]
    pub knob_change_threshold: f32,
    /// Input torque = factor / rpm.
    #[serde(default = "default_torque_factor")]
    pub torque_input_factor: f32,
    /// Output torque = input * ratio.
    #[serde(default = "default_gear_ratio")]
    pub torque_gear_ratio: f32,
    #[serde(default = "default_torque_green_max")]
    pub torque_green_max: f32,
    #[serde(default = "default_torque_yellow_max")]
    pub torque_yellow_max: f32,
    #[serde(default = "default_beacon_hz")]
    pub beacon_hz: f32,
    #[serde(default = "default_beacon_sound")]
    pub beacon_sound: PathBuf,
    #[serde(default = "default_beacon_volume")]
    pub beacon_volume: f64,
}

fn default_rpm_green_max() -> f32 {
    500.0
}
fn default_rpm_yellow_max() -> f32 {
    800.0
}
fn default_knob_threshold() -> f32 {
    1.0
}
fn default_torque_factor() -> f32 {
    500_000.0
}
fn default_gear_ratio() -> f32 {
    4.0
}
fn default_torque_green_max() -> f32 {
    1000.0
}
fn default_torque_yellow_max() -> f32 {
    2500.0
}
fn default_beacon_hz() -> f32 {
    2.0
}
fn default_beacon_sound() -> PathBuf {
    PathBuf::from("assets/beep_loop.ogg")
}
fn default_beacon_volume() -> f64 {
    0.7
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            rpm_min: 0.0,
            rpm_green_max: default_rpm_green_max(),
            rpm_yellow_max: default_rpm_yellow_max(),
            rpm_max: default_max_rpm(),
            zero_until_knob_moves: true,
            knob_change_threshold: default_knob_threshold(),
            torque_input_factor: default_torque_factor(),
            torque_gear_ratio: default_gear_ratio(),
            torque_green_max: default_torque_green_max(),
            torque_yellow_max: default_torque_yellow_max(),
            beacon_hz: default_beacon_hz(),
            beacon_sound: default_beacon_sound(),
            beacon_volume: default_beacon_volume(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleConfig {
    /// Names of the scene objects the toggle key shows and hides.
    #[serde(default = "default_toggle_targets")]
    pub targets: Vec<String>,
    #[serde(default)]
    pub start_hidden: bool,
}

fn default_toggle_targets() -> Vec<String> {
    vec!["housing_cover".to_string()]
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            targets: default_toggle_targets(),
            start_hidden: false,
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    /// Load `config.ron`, writing the defaults out on first run.
    pub fn load() -> Self {
        let path = config_path();
        let config = Self::load_from(&path);
        if !path.exists() {
            config.save();
        }
        config
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => match Self::parse(&data) {
                Ok(c) => {
                    log::info!("Loaded config from {:?}", path);
                    return c;
                }
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            },
            Err(_) => log::info!("No config at {:?}, using defaults", path),
        }
        Self::default()
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.ron")
}
