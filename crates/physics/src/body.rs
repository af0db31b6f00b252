//! Borrowed handle to one live body.

use crate::collision::PhysicsBody;
use crate::properties::SimulationProperties;
use crate::PhysicsWorld;
use engine_core::{Pose, Vec3};
use rapier3d::prelude::*;

/// Mutable view of a body that was alive when the view was created.
///
/// Obtained from [`PhysicsWorld::body_mut`]; holding it keeps the world
/// borrowed, so the body cannot disappear while the view exists.
pub struct BodyMut<'w> {
    world: &'w mut PhysicsWorld,
    body: PhysicsBody,
}

impl<'w> BodyMut<'w> {
    pub(crate) fn new(world: &'w mut PhysicsWorld, body: PhysicsBody) -> Self {
        Self { world, body }
    }

    pub fn handles(&self) -> PhysicsBody {
        self.body
    }

    pub fn pose(&self) -> Pose {
        self.world
            .body_pose(self.body.rigid_body)
            .unwrap_or_default()
    }

    /// World-space bounding half extents of the body's collider.
    pub fn half_extents(&self) -> Vec3 {
        self.body
            .collider
            .and_then(|c| self.world.collider_half_extents(c))
            .unwrap_or(Vec3::ZERO)
    }

    pub fn simulation_properties(&self) -> Option<SimulationProperties> {
        self.world.simulation_properties(self.body)
    }

    pub fn apply_simulation_properties(&mut self, properties: &SimulationProperties) {
        self.world
            .apply_simulation_properties(self.body, properties);
    }

    pub fn collision_groups(&self) -> Option<InteractionGroups> {
        self.body
            .collider
            .and_then(|c| self.world.collision_groups(c))
    }

    pub fn set_collision_groups(&mut self, groups: InteractionGroups) {
        if let Some(collider) = self.body.collider {
            self.world.set_collision_groups(collider, groups);
        }
    }

    /// Move towards `pose` over the next step. Kinematic bodies sweep
    /// there; other body types are placed directly.
    pub fn drive_to(&mut self, pose: Pose) {
        let handle = self.body.rigid_body;
        let Some(rb) = self.world.rigid_body_set.get_mut(handle) else {
            return;
        };
        if rb.is_kinematic() {
            let p = pose.position;
            rb.set_next_kinematic_translation(vector![p.x, p.y, p.z]);
            let q = pose.rotation;
            rb.set_next_kinematic_rotation(rapier3d::na::UnitQuaternion::from_quaternion(
                rapier3d::na::Quaternion::new(q.w, q.x, q.y, q.z),
            ));
        } else {
            self.world.teleport(handle, pose);
        }
    }

    /// Place the body at `pose` immediately.
    pub fn teleport(&mut self, pose: Pose) {
        self.world.teleport(self.body.rigid_body, pose);
    }
}
