//! Aim ray handed to the controller each frame.

use glam::Vec3;

/// World-space ray through the centre of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimRay {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl AimRay {
    /// Build a ray, normalizing `direction`. A zero direction falls back to -Z.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(-Vec3::Z),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}
