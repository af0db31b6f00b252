//! Poses, transforms and exponential smoothing.

use glam::{Mat4, Quat, Vec3};

/// Rigid placement of an object: where it is and which way it faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Straight-line distance between this pose's origin and `point`.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }

    pub fn to_matrix(&self, scale: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(scale, self.rotation, self.position)
    }
}

/// A pose plus a render scale. Used for cameras and for parts that never
/// touch the physics world (gear teeth, plungers, knob caps).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn from_pose(pose: Pose, scale: Vec3) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            scale,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation)
    }

    /// Model matrix for rendering.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Forward direction (negative Z in right-handed coordinates).
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }
}

/// Blend factor of one exponential smoothing step: `1 - e^(-speed * dt)`.
///
/// Applying it every step converges geometrically on a moving target and
/// gives the same trajectory regardless of how `dt` is sliced.
pub fn smoothing_factor(speed: f32, dt: f32) -> f32 {
    if speed <= 0.0 || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-speed * dt).exp()
}

/// One exponential smoothing step of a point towards `target`.
pub fn smooth_towards(current: Vec3, target: Vec3, speed: f32, dt: f32) -> Vec3 {
    current.lerp(target, smoothing_factor(speed, dt))
}

/// One exponential smoothing step of an orientation towards `target`.
pub fn smooth_rotation_towards(current: Quat, target: Quat, speed: f32, dt: f32) -> Quat {
    current.slerp(target, smoothing_factor(speed, dt))
}

/// One exponential smoothing step of a scalar towards `target`.
pub fn smooth_scalar(current: f32, target: f32, speed: f32, dt: f32) -> f32 {
    current + (target - current) * smoothing_factor(speed, dt)
}

/// Maps `value` from `[from_min, from_max]` onto `[to_min, to_max]`, clamped.
pub fn remap_clamped(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let span = from_max - from_min;
    if span.abs() <= f32::EPSILON {
        return to_min;
    }
    let t = ((value - from_min) / span).clamp(0.0, 1.0);
    to_min + (to_max - to_min) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_factor_is_zero_for_degenerate_inputs() {
        assert_eq!(smoothing_factor(0.0, 0.016), 0.0);
        assert_eq!(smoothing_factor(60.0, 0.0), 0.0);
    }

    #[test]
    fn smoothing_is_independent_of_step_slicing() {
        let target = Vec3::new(1.0, 2.0, 3.0);
        let one_step = smooth_towards(Vec3::ZERO, target, 10.0, 0.1);

        let mut two_steps = Vec3::ZERO;
        for _ in 0..2 {
            two_steps = smooth_towards(two_steps, target, 10.0, 0.05);
        }

        assert!(one_step.distance(two_steps) < 1e-5);
    }

    #[test]
    fn smoothing_never_overshoots() {
        let mut p = Vec3::ZERO;
        let target = Vec3::X;
        for _ in 0..200 {
            p = smooth_towards(p, target, 60.0, 1.0 / 60.0);
            assert!(p.x <= 1.0 + 1e-6);
        }
        assert!((p.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn remap_clamps_to_target_range() {
        assert_eq!(remap_clamped(0.5, 0.0, 1.0, -135.0, 135.0), 0.0);
        assert_eq!(remap_clamped(2.0, 0.0, 1.0, 0.0, 1000.0), 1000.0);
        assert_eq!(remap_clamped(-1.0, 0.0, 1.0, 0.0, 1000.0), 0.0);
        assert_eq!(remap_clamped(3.0, 1.0, 1.0, 7.0, 9.0), 7.0);
    }

    #[test]
    fn transform_forward_is_negative_z() {
        let t = Transform::default();
        assert_eq!(t.forward(), -Vec3::Z);
    }
}
