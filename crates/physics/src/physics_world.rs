//! Physics world management with Rapier3D.

use std::collections::HashMap;

use crate::body::BodyMut;
use crate::collision::{entity_from_user_data, entity_to_user_data, CollisionGroup, PhysicsBody};
use crate::properties::{Interpolation, SimulationProperties};
use engine_core::{Pose, Quat, Vec3};
use hecs::Entity;
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

/// Collider geometry used by the scene builders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    /// Cylinder along the local Y axis.
    Cylinder { half_height: f32, radius: f32 },
    Ball { radius: f32 },
}

impl ColliderShape {
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Cuboid { half_extents }
    }

    fn builder(&self) -> ColliderBuilder {
        match *self {
            Self::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Self::Cylinder {
                half_height,
                radius,
            } => ColliderBuilder::cylinder(half_height, radius),
            Self::Ball { radius } => ColliderBuilder::ball(radius),
        }
    }
}

pub(crate) fn isometry_from_pose(pose: &Pose) -> Isometry<Real> {
    let p = pose.position;
    let q = pose.rotation;
    Isometry3::from_parts(
        Translation3::new(p.x, p.y, p.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

pub(crate) fn pose_from_isometry(iso: &Isometry<Real>) -> Pose {
    let t = iso.translation.vector;
    let r = iso.rotation;
    Pose::new(
        Vec3::new(t.x, t.y, t.z),
        Quat::from_xyzw(r.i, r.j, r.k, r.w),
    )
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
    /// Bodies whose rendered pose is blended between steps.
    interpolation: HashMap<RigidBodyHandle, Interpolation>,
    /// Pose of each interpolated body before the last step.
    previous_poses: HashMap<RigidBodyHandle, Pose>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, -9.81, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            interpolation: HashMap::new(),
            previous_poses: HashMap::new(),
        }
    }

    /// Length of one simulation step in seconds.
    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    pub fn set_timestep(&mut self, dt: f32) {
        if dt > 0.0 {
            self.integration_parameters.dt = dt;
        }
    }

    /// Step the physics simulation.
    pub fn step(&mut self) {
        for (handle, mode) in &self.interpolation {
            if *mode == Interpolation::Interpolate {
                if let Some(body) = self.rigid_body_set.get(*handle) {
                    self.previous_poses
                        .insert(*handle, pose_from_isometry(body.position()));
                }
            }
        }

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Update query pipeline for raycasting.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    fn insert_body(
        &mut self,
        builder: RigidBodyBuilder,
        entity: Option<Entity>,
        pose: Pose,
        shape: ColliderShape,
        groups: InteractionGroups,
    ) -> PhysicsBody {
        let user_data = entity.map_or(0, entity_to_user_data);
        let rigid_body = builder
            .position(isometry_from_pose(&pose))
            .user_data(user_data)
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);
        let collider = shape
            .builder()
            .collision_groups(groups)
            .user_data(user_data)
            .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        PhysicsBody::with_collider(handle, collider)
    }

    /// Add a dynamic body with a single collider.
    pub fn add_dynamic(
        &mut self,
        entity: Option<Entity>,
        pose: Pose,
        shape: ColliderShape,
        groups: InteractionGroups,
    ) -> PhysicsBody {
        self.insert_body(RigidBodyBuilder::dynamic(), entity, pose, shape, groups)
    }

    /// Add a fixed body (tabletop, housing, panel control).
    pub fn add_fixed(
        &mut self,
        entity: Option<Entity>,
        pose: Pose,
        shape: ColliderShape,
        groups: InteractionGroups,
    ) -> PhysicsBody {
        self.insert_body(RigidBodyBuilder::fixed(), entity, pose, shape, groups)
    }

    /// Add a kinematic body moved by setting its next position.
    pub fn add_kinematic(
        &mut self,
        entity: Option<Entity>,
        pose: Pose,
        shape: ColliderShape,
        groups: InteractionGroups,
    ) -> PhysicsBody {
        self.insert_body(
            RigidBodyBuilder::kinematic_position_based(),
            entity,
            pose,
            shape,
            groups,
        )
    }

    /// Add a free-standing sensor volume fixed in the world.
    pub fn add_sensor(
        &mut self,
        entity: Option<Entity>,
        pose: Pose,
        shape: ColliderShape,
        groups: InteractionGroups,
    ) -> ColliderHandle {
        let collider = shape
            .builder()
            .position(isometry_from_pose(&pose))
            .sensor(true)
            .collision_groups(groups)
            .user_data(entity.map_or(0, entity_to_user_data))
            .build();
        self.collider_set.insert(collider)
    }

    /// Add a ground plane collider (flat Y=0 half-space).
    pub fn add_ground_plane(&mut self) -> ColliderHandle {
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .collision_groups(CollisionGroup::environment())
            .build();
        self.collider_set.insert(collider)
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.interpolation.remove(&handle);
        self.previous_poses.remove(&handle);
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    pub fn contains_body(&self, body: PhysicsBody) -> bool {
        self.rigid_body_set.contains(body.rigid_body)
            && body
                .collider
                .map_or(true, |c| self.collider_set.contains(c))
    }

    /// Mutable view of a live body, or `None` if it was removed.
    pub fn body_mut(&mut self, body: PhysicsBody) -> Option<BodyMut<'_>> {
        if self.contains_body(body) {
            Some(BodyMut::new(self, body))
        } else {
            None
        }
    }

    /// Current pose of a rigid body.
    pub fn body_pose(&self, handle: RigidBodyHandle) -> Option<Pose> {
        self.rigid_body_set
            .get(handle)
            .map(|body| pose_from_isometry(body.position()))
    }

    /// Pose to draw this frame: blended from the previous step for bodies
    /// with interpolation on, the current pose otherwise.
    pub fn render_pose(&self, handle: RigidBodyHandle, alpha: f32) -> Option<Pose> {
        let current = self.body_pose(handle)?;
        if self.interpolation(handle) != Interpolation::Interpolate {
            return Some(current);
        }
        Some(match self.previous_poses.get(&handle) {
            Some(prev) => Pose::new(
                prev.position.lerp(current.position, alpha),
                prev.rotation.slerp(current.rotation, alpha),
            ),
            None => current,
        })
    }

    pub fn interpolation(&self, handle: RigidBodyHandle) -> Interpolation {
        self.interpolation.get(&handle).copied().unwrap_or_default()
    }

    pub fn set_interpolation(&mut self, handle: RigidBodyHandle, mode: Interpolation) {
        match mode {
            Interpolation::None => {
                self.interpolation.remove(&handle);
                self.previous_poses.remove(&handle);
            }
            Interpolation::Interpolate => {
                self.interpolation.insert(handle, mode);
            }
        }
    }

    /// Snapshot of every simulation property the manipulation code touches.
    pub fn simulation_properties(&self, body: PhysicsBody) -> Option<SimulationProperties> {
        let rb = self.rigid_body_set.get(body.rigid_body)?;
        let collider = body.collider.and_then(|c| self.collider_set.get(c));
        Some(SimulationProperties::capture(
            rb,
            collider,
            self.interpolation(body.rigid_body),
        ))
    }

    /// Apply a full property set. Returns `false` if the body no longer exists.
    pub fn apply_simulation_properties(
        &mut self,
        body: PhysicsBody,
        properties: &SimulationProperties,
    ) -> bool {
        let Some(rb) = self.rigid_body_set.get_mut(body.rigid_body) else {
            return false;
        };
        let collider = body.collider.and_then(|c| self.collider_set.get_mut(c));
        properties.apply_to(rb, collider);
        self.set_interpolation(body.rigid_body, properties.interpolation);
        true
    }

    pub fn collision_groups(&self, collider: ColliderHandle) -> Option<InteractionGroups> {
        self.collider_set.get(collider).map(|c| c.collision_groups())
    }

    pub fn set_collision_groups(&mut self, collider: ColliderHandle, groups: InteractionGroups) {
        if let Some(c) = self.collider_set.get_mut(collider) {
            c.set_collision_groups(groups);
        }
    }

    /// World-space half extents of the collider's bounding box.
    pub fn collider_half_extents(&self, collider: ColliderHandle) -> Option<Vec3> {
        self.collider_set.get(collider).map(|c| {
            let he = c.compute_aabb().half_extents();
            Vec3::new(he.x, he.y, he.z)
        })
    }

    /// Entity stored on a collider at creation.
    pub fn collider_entity(&self, collider: ColliderHandle) -> Option<Entity> {
        self.collider_set
            .get(collider)
            .and_then(|c| entity_from_user_data(c.user_data))
    }

    /// Rigid body that owns a collider.
    pub fn collider_parent(&self, collider: ColliderHandle) -> Option<RigidBodyHandle> {
        self.collider_set.get(collider).and_then(|c| c.parent())
    }

    /// Set the target of a kinematic body for the next step.
    pub fn set_kinematic_position(&mut self, handle: RigidBodyHandle, position: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_next_kinematic_translation(vector![position.x, position.y, position.z]);
        }
    }

    /// Move a body instantly, with no swept motion in between.
    pub fn teleport(&mut self, handle: RigidBodyHandle, pose: Pose) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            let iso = isometry_from_pose(&pose);
            body.set_position(iso, true);
            body.set_next_kinematic_position(iso);
        }
        self.previous_poses.insert(handle, pose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_box_falls_onto_ground() {
        let mut world = PhysicsWorld::new();
        world.add_ground_plane();
        let body = world.add_dynamic(
            None,
            Pose::from_position(Vec3::new(0.0, 2.0, 0.0)),
            ColliderShape::cuboid(Vec3::splat(0.1)),
            CollisionGroup::interactable(),
        );
        for _ in 0..240 {
            world.step();
        }
        let pose = world.body_pose(body.rigid_body).unwrap();
        assert!(pose.position.y < 0.2 && pose.position.y > 0.0);
    }

    #[test]
    fn entity_is_stored_on_collider() {
        let mut ecs = hecs::World::new();
        let e = ecs.spawn(());
        let mut world = PhysicsWorld::new();
        let body = world.add_fixed(
            Some(e),
            Pose::IDENTITY,
            ColliderShape::cuboid(Vec3::ONE),
            CollisionGroup::environment(),
        );
        assert_eq!(world.collider_entity(body.collider.unwrap()), Some(e));
        assert_eq!(world.collider_parent(body.collider.unwrap()), Some(body.rigid_body));
    }

    #[test]
    fn removed_body_has_no_view() {
        let mut world = PhysicsWorld::new();
        let body = world.add_dynamic(
            None,
            Pose::IDENTITY,
            ColliderShape::Ball { radius: 0.1 },
            CollisionGroup::interactable(),
        );
        assert!(world.body_mut(body).is_some());
        world.remove_body(body.rigid_body);
        assert!(world.body_mut(body).is_none());
        assert!(world.simulation_properties(body).is_none());
    }

    #[test]
    fn teleport_overrides_pending_kinematic_target() {
        let mut world = PhysicsWorld::new();
        let body = world.add_kinematic(
            None,
            Pose::IDENTITY,
            ColliderShape::Ball { radius: 0.1 },
            CollisionGroup::interactable(),
        );
        world.set_kinematic_position(body.rigid_body, Vec3::new(5.0, 0.0, 0.0));
        world.teleport(body.rigid_body, Pose::from_position(Vec3::new(0.0, 1.0, 0.0)));
        world.step();
        let pose = world.body_pose(body.rigid_body).unwrap();
        assert!(pose.position.distance(Vec3::new(0.0, 1.0, 0.0)) < 1e-4);
    }

    #[test]
    fn interpolated_pose_blends_between_steps() {
        let mut world = PhysicsWorld::new();
        let body = world.add_kinematic(
            None,
            Pose::IDENTITY,
            ColliderShape::Ball { radius: 0.1 },
            CollisionGroup::interactable(),
        );
        world.set_interpolation(body.rigid_body, Interpolation::Interpolate);
        world.set_kinematic_position(body.rigid_body, Vec3::new(1.0, 0.0, 0.0));
        world.step();

        let half = world.render_pose(body.rigid_body, 0.5).unwrap();
        assert!((half.position.x - 0.5).abs() < 1e-4);

        world.set_interpolation(body.rigid_body, Interpolation::None);
        let snapped = world.render_pose(body.rigid_body, 0.5).unwrap();
        assert!((snapped.position.x - 1.0).abs() < 1e-4);
    }
}
