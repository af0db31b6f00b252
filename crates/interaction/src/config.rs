//! Tunables for the manipulation controller and placement zones.

use physics::{CollisionGroup, Group};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A configuration value that was out of range and has been repaired.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("{field} must be positive, got {value}; using {replacement}")]
    NotPositive {
        field: &'static str,
        value: f32,
        replacement: f32,
    },
    #[error("{field} must not be negative, got {value}; using 0")]
    Negative { field: &'static str, value: f32 },
    #[error("min_hold_distance {min} is above max_hold_distance {max}; swapped")]
    InvertedHoldRange { min: f32, max: f32 },
    #[error("hold_distance {value} outside [{min}, {max}]; clamped")]
    HoldDistanceOutOfRange { value: f32, min: f32, max: f32 },
    #[error("min_up_normal {value} outside [-1, 1]; clamped")]
    NormalThresholdOutOfRange { value: f32 },
    #[error("{field} is empty; that query will never hit")]
    EmptyMask { field: &'static str },
}

/// Controller settings. Every field has a serde default so a partial
/// `manipulation: (...)` block in `config.ron` is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulationConfig {
    /// Reach of the grab ray in meters.
    #[serde(default = "default_max_grab_distance")]
    pub max_grab_distance: f32,
    /// Reach of the surface-detection ray while holding.
    #[serde(default = "default_surface_ray_distance")]
    pub surface_ray_distance: f32,
    /// Minimum upward normal component for a hit to count as a surface.
    #[serde(default = "default_min_up_normal")]
    pub min_up_normal: f32,
    /// Gap left between a resting object and the surface below it.
    #[serde(default = "default_surface_clearance")]
    pub surface_clearance: f32,
    #[serde(default = "default_probe_radius")]
    pub probe_radius: f32,
    #[serde(default = "default_probe_margin")]
    pub probe_margin: f32,
    /// Exponential smoothing rate (1/s).
    #[serde(default = "default_follow_speed")]
    pub follow_speed: f32,
    /// Initial free-mode distance in front of the camera.
    #[serde(default = "default_hold_distance")]
    pub hold_distance: f32,
    #[serde(default = "default_min_hold_distance")]
    pub min_hold_distance: f32,
    #[serde(default = "default_max_hold_distance")]
    pub max_hold_distance: f32,
    /// Zoom speed in meters per second.
    #[serde(default = "default_zoom_rate")]
    pub zoom_rate: f32,
    #[serde(default = "default_interactable_mask")]
    pub interactable_mask: Vec<CollisionGroup>,
    #[serde(default = "default_surface_mask")]
    pub surface_mask: Vec<CollisionGroup>,
    #[serde(default = "default_obstacle_mask")]
    pub obstacle_mask: Vec<CollisionGroup>,
    /// Move the carried collider into the `Held` group for the hold.
    #[serde(default = "default_true")]
    pub use_held_layer: bool,
}

fn default_max_grab_distance() -> f32 {
    3.0
}
fn default_surface_ray_distance() -> f32 {
    10.0
}
fn default_min_up_normal() -> f32 {
    0.6
}
fn default_surface_clearance() -> f32 {
    0.003
}
fn default_probe_radius() -> f32 {
    0.08
}
fn default_probe_margin() -> f32 {
    0.01
}
fn default_follow_speed() -> f32 {
    60.0
}
fn default_hold_distance() -> f32 {
    1.2
}
fn default_min_hold_distance() -> f32 {
    0.4
}
fn default_max_hold_distance() -> f32 {
    2.5
}
fn default_zoom_rate() -> f32 {
    0.8
}
fn default_interactable_mask() -> Vec<CollisionGroup> {
    vec![CollisionGroup::Interactable]
}
fn default_surface_mask() -> Vec<CollisionGroup> {
    vec![CollisionGroup::Surface]
}
fn default_obstacle_mask() -> Vec<CollisionGroup> {
    vec![CollisionGroup::Environment]
}
fn default_true() -> bool {
    true
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            max_grab_distance: default_max_grab_distance(),
            surface_ray_distance: default_surface_ray_distance(),
            min_up_normal: default_min_up_normal(),
            surface_clearance: default_surface_clearance(),
            probe_radius: default_probe_radius(),
            probe_margin: default_probe_margin(),
            follow_speed: default_follow_speed(),
            hold_distance: default_hold_distance(),
            min_hold_distance: default_min_hold_distance(),
            max_hold_distance: default_max_hold_distance(),
            zoom_rate: default_zoom_rate(),
            interactable_mask: default_interactable_mask(),
            surface_mask: default_surface_mask(),
            obstacle_mask: default_obstacle_mask(),
            use_held_layer: default_true(),
        }
    }
}

fn require_positive(
    field: &'static str,
    value: &mut f32,
    replacement: f32,
    issues: &mut Vec<ConfigIssue>,
) {
    if !(*value > 0.0) {
        issues.push(ConfigIssue::NotPositive {
            field,
            value: *value,
            replacement,
        });
        *value = replacement;
    }
}

fn require_non_negative(field: &'static str, value: &mut f32, issues: &mut Vec<ConfigIssue>) {
    if !(*value >= 0.0) {
        issues.push(ConfigIssue::Negative {
            field,
            value: *value,
        });
        *value = 0.0;
    }
}

impl ManipulationConfig {
    pub fn interactable_groups(&self) -> Group {
        CollisionGroup::mask(&self.interactable_mask)
    }

    pub fn surface_groups(&self) -> Group {
        CollisionGroup::mask(&self.surface_mask)
    }

    pub fn obstacle_groups(&self) -> Group {
        CollisionGroup::mask(&self.obstacle_mask)
    }

    /// Repair out-of-range values. Returns the repaired config and one
    /// issue per repair; empty masks are reported but left empty.
    pub fn sanitized(mut self) -> (Self, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        require_positive(
            "max_grab_distance",
            &mut self.max_grab_distance,
            default_max_grab_distance(),
            &mut issues,
        );
        require_positive(
            "surface_ray_distance",
            &mut self.surface_ray_distance,
            default_surface_ray_distance(),
            &mut issues,
        );
        require_positive(
            "follow_speed",
            &mut self.follow_speed,
            default_follow_speed(),
            &mut issues,
        );
        require_non_negative("surface_clearance", &mut self.surface_clearance, &mut issues);
        require_non_negative("probe_radius", &mut self.probe_radius, &mut issues);
        require_non_negative("probe_margin", &mut self.probe_margin, &mut issues);
        require_non_negative("zoom_rate", &mut self.zoom_rate, &mut issues);
        require_non_negative("min_hold_distance", &mut self.min_hold_distance, &mut issues);
        require_non_negative("max_hold_distance", &mut self.max_hold_distance, &mut issues);

        if self.min_hold_distance > self.max_hold_distance {
            issues.push(ConfigIssue::InvertedHoldRange {
                min: self.min_hold_distance,
                max: self.max_hold_distance,
            });
            std::mem::swap(&mut self.min_hold_distance, &mut self.max_hold_distance);
        }

        let clamped = if self.hold_distance.is_finite() {
            self.hold_distance
                .clamp(self.min_hold_distance, self.max_hold_distance)
        } else {
            default_hold_distance().clamp(self.min_hold_distance, self.max_hold_distance)
        };
        if clamped != self.hold_distance {
            issues.push(ConfigIssue::HoldDistanceOutOfRange {
                value: self.hold_distance,
                min: self.min_hold_distance,
                max: self.max_hold_distance,
            });
            self.hold_distance = clamped;
        }

        if !(-1.0..=1.0).contains(&self.min_up_normal) {
            issues.push(ConfigIssue::NormalThresholdOutOfRange {
                value: self.min_up_normal,
            });
            self.min_up_normal = if self.min_up_normal.is_nan() {
                default_min_up_normal()
            } else {
                self.min_up_normal.clamp(-1.0, 1.0)
            };
        }

        for (field, mask) in [
            ("interactable_mask", &self.interactable_mask),
            ("surface_mask", &self.surface_mask),
            ("obstacle_mask", &self.obstacle_mask),
        ] {
            if mask.is_empty() {
                issues.push(ConfigIssue::EmptyMask { field });
            }
        }

        (self, issues)
    }
}

/// How a zone treats its tag filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagPolicy {
    /// The tag is advisory: untagged or differently tagged objects pass.
    #[default]
    Permissive,
    /// Only objects carrying exactly the configured tag pass.
    Strict,
}

/// Defaults shared by the placement zones built for the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Capture distance around the target pose, in meters.
    #[serde(default = "default_acceptance_radius")]
    pub acceptance_radius: f32,
    #[serde(default = "default_required_tag")]
    pub required_tag: Option<String>,
    #[serde(default)]
    pub tag_policy: TagPolicy,
    #[serde(default = "default_highlight_color")]
    pub highlight_color: [f32; 3],
    #[serde(default = "default_emission_intensity")]
    pub emission_intensity: f32,
    /// Freeze committed objects in place (kinematic, all axes locked).
    #[serde(default = "default_true")]
    pub lock_after_commit: bool,
}

fn default_acceptance_radius() -> f32 {
    0.15
}
fn default_required_tag() -> Option<String> {
    Some("Grabbable".to_string())
}
fn default_highlight_color() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}
fn default_emission_intensity() -> f32 {
    3.0
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            acceptance_radius: default_acceptance_radius(),
            required_tag: default_required_tag(),
            tag_policy: TagPolicy::default(),
            highlight_color: default_highlight_color(),
            emission_intensity: default_emission_intensity(),
            lock_after_commit: default_true(),
        }
    }
}
