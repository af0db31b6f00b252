//! Simulation property sets that can be captured from and applied to a body.

use engine_core::Vec3;
use rapier3d::prelude::*;

/// Whether the renderer blends a body's pose between fixed steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    #[default]
    None,
    Interpolate,
}

/// Speculative CCD margin used while a body is carried.
const CARRIED_SOFT_CCD: Real = 0.1;

/// Every simulation knob the manipulation code touches, as one value.
///
/// Restoring after a drop and locking after a commit are both a single
/// [`PhysicsWorld::apply_simulation_properties`](crate::PhysicsWorld::apply_simulation_properties)
/// call with a different value, so no field can be forgotten on one path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationProperties {
    pub gravity_scale: f32,
    pub body_type: RigidBodyType,
    pub collisions_enabled: bool,
    pub ccd_enabled: bool,
    pub soft_ccd_prediction: f32,
    pub locked_axes: LockedAxes,
    pub interpolation: Interpolation,
    /// Trigger-style collider: reports overlaps, never pushes.
    pub sensor: bool,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl SimulationProperties {
    /// While carried: moved directly by the controller, ignores gravity,
    /// still visible to queries, never shoves other bodies.
    pub const CARRIED: Self = Self {
        gravity_scale: 0.0,
        body_type: RigidBodyType::KinematicPositionBased,
        collisions_enabled: true,
        ccd_enabled: false,
        soft_ccd_prediction: CARRIED_SOFT_CCD,
        locked_axes: LockedAxes::empty(),
        interpolation: Interpolation::Interpolate,
        sensor: true,
        linear_velocity: Vec3::ZERO,
        angular_velocity: Vec3::ZERO,
    };

    /// After a placement commit: immobile, solid, gravity-free.
    pub const LOCKED: Self = Self {
        gravity_scale: 0.0,
        body_type: RigidBodyType::KinematicPositionBased,
        collisions_enabled: true,
        ccd_enabled: false,
        soft_ccd_prediction: 0.0,
        locked_axes: LockedAxes::all(),
        interpolation: Interpolation::None,
        sensor: false,
        linear_velocity: Vec3::ZERO,
        angular_velocity: Vec3::ZERO,
    };

    /// Read the current property set of a body and its collider.
    pub fn capture(
        body: &RigidBody,
        collider: Option<&Collider>,
        interpolation: Interpolation,
    ) -> Self {
        let linvel = body.linvel();
        let angvel = body.angvel();
        Self {
            gravity_scale: body.gravity_scale(),
            body_type: body.body_type(),
            collisions_enabled: collider.map_or(true, |c| c.is_enabled()),
            ccd_enabled: body.is_ccd_enabled(),
            soft_ccd_prediction: body.soft_ccd_prediction(),
            locked_axes: body.locked_axes(),
            interpolation,
            sensor: collider.map_or(false, |c| c.is_sensor()),
            linear_velocity: Vec3::new(linvel.x, linvel.y, linvel.z),
            angular_velocity: Vec3::new(angvel.x, angvel.y, angvel.z),
        }
    }

    /// Write every field onto the body and collider. Interpolation lives
    /// outside rapier and is handled by the caller.
    pub fn apply_to(&self, body: &mut RigidBody, collider: Option<&mut Collider>) {
        // Rapier only stores velocities on dynamic bodies; write them while
        // dynamic, then switch to the requested type.
        body.set_body_type(RigidBodyType::Dynamic, false);
        body.set_linvel(
            vector![self.linear_velocity.x, self.linear_velocity.y, self.linear_velocity.z],
            false,
        );
        body.set_angvel(
            vector![self.angular_velocity.x, self.angular_velocity.y, self.angular_velocity.z],
            false,
        );
        body.set_body_type(self.body_type, true);

        body.set_gravity_scale(self.gravity_scale, true);
        body.enable_ccd(self.ccd_enabled);
        body.set_soft_ccd_prediction(self.soft_ccd_prediction);
        body.set_locked_axes(self.locked_axes, true);

        if let Some(collider) = collider {
            collider.set_sensor(self.sensor);
            collider.set_enabled(self.collisions_enabled);
        }
    }
}
