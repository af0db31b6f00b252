//! Grab, carry and drop lifecycle for a single object.

use crate::aim::AimRay;
use crate::config::ManipulationConfig;
use crate::holdable::Holdable;
use crate::registry::{ZoneAssignment, ZoneId, ZoneRegistry};
use crate::zone::{CandidateInfo, Zone};
use engine_core::{smooth_towards, Pose};
use glam::Vec3;
use hecs::Entity;
use physics::{
    CollisionGroup, InteractionGroups, PhysicsBody, PhysicsWorld, QueryMask, SimulationProperties,
};

/// Per-frame input relevant to manipulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManipulationInput {
    /// Grab button went down this frame.
    pub grab_pressed: bool,
    /// Grab button went up this frame.
    pub release_pressed: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    /// Aim is available (cursor locked to the view).
    pub aim_enabled: bool,
}

/// How the carried object is currently being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Resting flush on a surface under the aim point.
    Surface,
    /// Floating at the hold distance in front of the viewer.
    Free,
}

/// What a release did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Nothing was held.
    NotHolding,
    /// Pre-grab properties were reapplied.
    Restored,
    /// The object was snapped into a zone.
    Committed(ZoneId),
    /// The held body had disappeared; nothing to restore.
    Lost,
}

struct HeldState {
    entity: Entity,
    body: PhysicsBody,
    snapshot: SimulationProperties,
    original_groups: Option<InteractionGroups>,
    zone: Option<ZoneId>,
    regime: Regime,
    destination: Vec3,
}

/// Carries at most one object at a time.
pub struct ManipulationController {
    config: ManipulationConfig,
    hold_distance: f32,
    held: Option<HeldState>,
}

impl ManipulationController {
    /// Create a controller. The config is sanitized first and each repair
    /// is logged.
    pub fn new(config: ManipulationConfig) -> Self {
        let (config, issues) = config.sanitized();
        for issue in &issues {
            log::warn!("Manipulation config: {}", issue);
        }
        Self {
            hold_distance: config.hold_distance,
            config,
            held: None,
        }
    }

    pub fn config(&self) -> &ManipulationConfig {
        &self.config
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn held_entity(&self) -> Option<Entity> {
        self.held.as_ref().map(|h| h.entity)
    }

    /// Free-mode distance. Persists across holds.
    pub fn hold_distance(&self) -> f32 {
        self.hold_distance
    }

    pub fn regime(&self) -> Option<Regime> {
        self.held.as_ref().map(|h| h.regime)
    }

    /// Destination computed by the last fixed step.
    pub fn destination(&self) -> Option<Vec3> {
        self.held.as_ref().map(|h| h.destination)
    }

    /// Per-frame input handling. Disabled aim releases immediately.
    pub fn update(
        &mut self,
        input: &ManipulationInput,
        aim: &AimRay,
        dt: f32,
        ecs: &hecs::World,
        physics: &mut PhysicsWorld,
        zones: &mut ZoneRegistry,
    ) {
        if !input.aim_enabled {
            if self.is_holding() {
                log::debug!("Aim disabled while holding, forcing release");
                self.force_release(physics, zones);
            }
            return;
        }

        if self.is_holding() {
            self.zoom(input.zoom_in, input.zoom_out, dt);
        }

        if input.grab_pressed {
            self.grab(aim, ecs, physics, zones);
        }
        if input.release_pressed {
            self.release(physics, zones);
        }
    }

    /// Adjust the free-mode distance by `zoom_rate * dt`, clamped.
    pub fn zoom(&mut self, zoom_in: bool, zoom_out: bool, dt: f32) {
        let delta = self.config.zoom_rate * dt.max(0.0);
        if zoom_in {
            self.hold_distance -= delta;
        }
        if zoom_out {
            self.hold_distance += delta;
        }
        self.hold_distance = self
            .hold_distance
            .clamp(self.config.min_hold_distance, self.config.max_hold_distance);
    }

    /// Pick up whatever interactable the aim ray hits. Returns whether a
    /// hold started.
    pub fn grab(
        &mut self,
        aim: &AimRay,
        ecs: &hecs::World,
        physics: &mut PhysicsWorld,
        zones: &mut ZoneRegistry,
    ) -> bool {
        if self.held.is_some() {
            return false;
        }

        let mask = QueryMask::new(self.config.interactable_groups());
        let Some(hit) = physics.raycast(
            aim.origin,
            aim.direction,
            self.config.max_grab_distance,
            mask,
        ) else {
            return false;
        };
        let Some(rigid_body) = physics.collider_parent(hit.collider) else {
            return false;
        };
        let Some(entity) = physics.collider_entity(hit.collider) else {
            log::debug!("Aimed collider {:?} has no entity, ignoring", hit.collider);
            return false;
        };
        let body = PhysicsBody::with_collider(rigid_body, hit.collider);

        let Some(mut view) = physics.body_mut(body) else {
            return false;
        };
        let Some(snapshot) = view.simulation_snapshot() else {
            return false;
        };
        let original_groups = view.collision_groups();
        view.apply_snapshot(&SimulationProperties::CARRIED);
        if self.config.use_held_layer {
            view.set_collision_groups(CollisionGroup::held());
        }
        let start = view.pose().position;

        let zone = ecs
            .get::<&ZoneAssignment>(entity)
            .ok()
            .and_then(|assignment| assignment.zone);
        if let Some(z) = zone.and_then(|id| zones.get_mut(id)) {
            if z.committed() == Some(entity) {
                z.uncommit(entity);
            }
            z.set_engaged(Some(entity));
        }

        log::info!("Grabbed {:?} at {:.2} m", entity, hit.distance);
        self.held = Some(HeldState {
            entity,
            body,
            snapshot,
            original_groups,
            zone,
            regime: Regime::Free,
            destination: start,
        });

        let dt = physics.timestep();
        self.fixed_update(aim, dt, physics, zones);
        true
    }

    /// Drop the held object, committing it to its zone if the zone accepts it.
    pub fn release(&mut self, physics: &mut PhysicsWorld, zones: &mut ZoneRegistry) -> ReleaseOutcome {
        self.drop_held(physics, zones, true)
    }

    /// Drop the held object and restore it, never committing.
    pub fn force_release(
        &mut self,
        physics: &mut PhysicsWorld,
        zones: &mut ZoneRegistry,
    ) -> ReleaseOutcome {
        self.drop_held(physics, zones, false)
    }

    fn drop_held(
        &mut self,
        physics: &mut PhysicsWorld,
        zones: &mut ZoneRegistry,
        allow_commit: bool,
    ) -> ReleaseOutcome {
        let Some(held) = self.held.take() else {
            return ReleaseOutcome::NotHolding;
        };
        let mut zone = held.zone.and_then(|id| zones.get_mut(id).map(|z| (id, z)));

        let Some(mut view) = physics.body_mut(held.body) else {
            log::warn!("Held object {:?} no longer exists, dropping hold", held.entity);
            if let Some((_, z)) = zone {
                z.set_engaged(None);
            }
            return ReleaseOutcome::Lost;
        };

        let mut outcome = ReleaseOutcome::Restored;
        if let Some((id, z)) = zone.as_mut() {
            let position = view.pose().position;
            if allow_commit && z.accepts(held.entity, position) && z.commit_candidate(&mut view) {
                outcome = ReleaseOutcome::Committed(*id);
            }
            z.set_engaged(None);
        }

        if outcome == ReleaseOutcome::Restored {
            view.apply_snapshot(&held.snapshot);
        }
        if let Some(groups) = held.original_groups {
            view.set_collision_groups(groups);
        }

        match outcome {
            ReleaseOutcome::Committed(id) => {
                log::info!("Released {:?} into zone {:?}", held.entity, id)
            }
            _ => log::info!("Released {:?}", held.entity),
        }
        outcome
    }

    /// Fixed-step update: pick the placement regime, compute the destination
    /// and move the held body one smoothing step towards it.
    pub fn fixed_update(
        &mut self,
        aim: &AimRay,
        dt: f32,
        physics: &mut PhysicsWorld,
        zones: &mut ZoneRegistry,
    ) {
        let Some(held) = self.held.as_ref() else {
            return;
        };
        if !physics.contains_body(held.body) {
            log::warn!("Held object {:?} vanished mid-hold", held.entity);
            self.drop_held(physics, zones, false);
            return;
        }

        let (destination, regime) = self.compute_destination(aim, physics, held.body);

        let Some(held) = self.held.as_mut() else {
            return;
        };
        if regime != held.regime {
            log::debug!("Placement regime {:?} -> {:?}", held.regime, regime);
            held.regime = regime;
        }
        held.destination = destination;

        let Some(mut view) = physics.body_mut(held.body) else {
            return;
        };
        let current = view.pose();
        let next = smooth_towards(current.position, destination, self.config.follow_speed, dt);
        view.drive_to(Pose::new(next, current.rotation));

        // Zones without a capture volume learn about the object from us.
        if let Some(zone) = held.zone.and_then(|id| zones.get_mut(id)) {
            if zone.volume().is_none() {
                zone.on_volume_stay(CandidateInfo {
                    entity: held.entity,
                    tag: None,
                    position: current.position,
                });
            }
        }
    }

    fn compute_destination(
        &self,
        aim: &AimRay,
        physics: &mut PhysicsWorld,
        body: PhysicsBody,
    ) -> (Vec3, Regime) {
        let half_extents = physics
            .body_mut(body)
            .map(|view| Holdable::half_extents(&view))
            .unwrap_or(Vec3::ZERO);

        if let Some(destination) = self.surface_destination(aim, physics, body, half_extents) {
            return (destination, Regime::Surface);
        }
        (self.free_destination(aim, physics, body), Regime::Free)
    }

    fn surface_destination(
        &self,
        aim: &AimRay,
        physics: &PhysicsWorld,
        body: PhysicsBody,
        half_extents: Vec3,
    ) -> Option<Vec3> {
        let mask = QueryMask::new(self.config.surface_groups())
            .excluding(body.rigid_body)
            .solids_only();
        let hit = physics
            .raycast_all(
                aim.origin,
                aim.direction,
                self.config.surface_ray_distance,
                mask,
            )
            .into_iter()
            .find(|hit| hit.normal.y >= self.config.min_up_normal)?;

        let support = hit.normal.abs().dot(half_extents);
        Some(Vec3::new(
            hit.point.x,
            hit.point.y + support + self.config.surface_clearance,
            hit.point.z,
        ))
    }

    fn free_destination(&self, aim: &AimRay, physics: &PhysicsWorld, body: PhysicsBody) -> Vec3 {
        let mask = QueryMask::new(self.config.obstacle_groups())
            .excluding(body.rigid_body)
            .solids_only();
        let distance = match physics.sphere_cast(
            aim.origin,
            aim.direction,
            self.config.probe_radius,
            self.hold_distance,
            mask,
        ) {
            Some(hit) => (hit.distance - self.config.probe_margin).max(0.0),
            None => self.hold_distance,
        };
        aim.point_at(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::PlacementZone;
    use engine_core::{Quat, Tag};
    use physics::{ColliderShape, Interpolation, LockedAxes, RigidBodyType};

    const DT: f32 = 1.0 / 60.0;
    const TABLE_TOP: f32 = 0.8;

    struct Bench {
        ecs: hecs::World,
        physics: PhysicsWorld,
        zones: ZoneRegistry,
        controller: ManipulationController,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                ecs: hecs::World::new(),
                physics: PhysicsWorld::new(),
                zones: ZoneRegistry::new(),
                controller: ManipulationController::new(ManipulationConfig::default()),
            }
        }

        fn without_gravity(mut self) -> Self {
            self.physics.gravity = [0.0, 0.0, 0.0].into();
            self
        }

        /// Table whose top face is at y = 0.8, spanning x and z in [-1, 1].
        fn add_table(&mut self) {
            self.physics.add_fixed(
                None,
                Pose::from_position(Vec3::new(0.0, TABLE_TOP - 0.05, 0.0)),
                ColliderShape::cuboid(Vec3::new(1.0, 0.05, 1.0)),
                CollisionGroup::surface(),
            );
        }

        fn add_wall(&mut self, z: f32) {
            self.physics.add_fixed(
                None,
                Pose::from_position(Vec3::new(0.0, 1.5, z)),
                ColliderShape::cuboid(Vec3::new(2.0, 2.0, 0.05)),
                CollisionGroup::environment(),
            );
        }

        fn add_cube(&mut self, position: Vec3, half: Vec3) -> (Entity, PhysicsBody) {
            let entity = self.ecs.spawn((Tag::new("Grabbable"),));
            let body = self.physics.add_dynamic(
                Some(entity),
                Pose::from_position(position),
                ColliderShape::cuboid(half),
                CollisionGroup::interactable(),
            );
            self.ecs.insert_one(entity, body).unwrap();
            (entity, body)
        }

        fn add_zone(&mut self, target: Vec3, radius: f32) -> ZoneId {
            let target = Pose::new(target, Quat::from_rotation_y(0.3));
            let volume = self.physics.add_sensor(
                None,
                target,
                ColliderShape::cuboid(Vec3::splat(0.5)),
                CollisionGroup::zone(),
            );
            self.zones
                .add(PlacementZone::new("socket", target, radius).with_volume(volume))
        }

        fn ready(&mut self) {
            self.physics.update_query_pipeline();
        }

        fn grab(&mut self, aim: &AimRay) -> bool {
            self.controller
                .grab(aim, &self.ecs, &mut self.physics, &mut self.zones)
        }

        fn release(&mut self) -> ReleaseOutcome {
            self.controller.release(&mut self.physics, &mut self.zones)
        }

        fn tick(&mut self, aim: &AimRay, steps: usize) {
            for _ in 0..steps {
                self.controller
                    .fixed_update(aim, DT, &mut self.physics, &mut self.zones);
                self.physics.step();
                self.zones.sync_volumes(&self.physics, &self.ecs);
            }
        }

        fn position(&self, body: PhysicsBody) -> Vec3 {
            self.physics.body_pose(body.rigid_body).unwrap().position
        }

        fn properties(&self, body: PhysicsBody) -> SimulationProperties {
            self.physics.simulation_properties(body).unwrap()
        }
    }

    fn aim_at(origin: Vec3, target: Vec3) -> AimRay {
        AimRay::new(origin, target - origin)
    }

    #[test]
    fn grab_with_no_hit_is_a_noop() {
        let mut bench = Bench::new();
        let (_, body) = bench.add_cube(Vec3::new(0.0, 1.0, -1.0), Vec3::splat(0.05));
        bench.ready();
        let before = bench.properties(body);

        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z);
        assert!(!bench.grab(&aim));
        assert!(!bench.controller.is_holding());
        assert_eq!(bench.properties(body), before);
    }

    #[test]
    fn grab_beyond_reach_is_a_noop() {
        let mut bench = Bench::new();
        bench.add_cube(Vec3::new(0.0, 1.0, -5.0), Vec3::splat(0.05));
        bench.ready();
        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);
        assert!(!bench.grab(&aim));
    }

    #[test]
    fn grab_applies_carried_properties() {
        let mut bench = Bench::new();
        let (entity, body) = bench.add_cube(Vec3::new(0.0, 1.0, -1.0), Vec3::splat(0.05));
        bench.ready();

        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);
        assert!(bench.grab(&aim));
        assert_eq!(bench.controller.held_entity(), Some(entity));

        let props = bench.properties(body);
        assert_eq!(props.body_type, RigidBodyType::KinematicPositionBased);
        assert_eq!(props.gravity_scale, 0.0);
        assert!(props.sensor);
        assert_eq!(props.interpolation, Interpolation::Interpolate);
        assert_eq!(
            bench.physics.collision_groups(body.collider.unwrap()),
            Some(CollisionGroup::held())
        );

        // A second grab while holding does nothing
        assert!(!bench.grab(&aim));
    }

    #[test]
    fn grab_release_restores_every_property() {
        let mut bench = Bench::new();
        let (_, body) = bench.add_cube(Vec3::new(0.0, 1.0, -1.0), Vec3::splat(0.05));
        {
            let rb = bench.physics.rigid_body_set.get_mut(body.rigid_body).unwrap();
            rb.set_gravity_scale(0.4, true);
            rb.enable_ccd(true);
            rb.set_locked_axes(LockedAxes::ROTATION_LOCKED_Y, true);
            rb.set_linvel([0.3, 0.0, 0.1].into(), true);
        }
        bench.ready();
        let before = bench.properties(body);
        let groups_before = bench.physics.collision_groups(body.collider.unwrap());

        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);
        assert!(bench.grab(&aim));
        bench.tick(&AimRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.5, 0.0, -1.0)), 20);

        assert_eq!(bench.release(), ReleaseOutcome::Restored);
        assert!(!bench.controller.is_holding());
        assert_eq!(bench.properties(body), before);
        assert_eq!(bench.physics.collision_groups(body.collider.unwrap()), groups_before);
    }

    #[test]
    fn release_without_hold_is_a_noop() {
        let mut bench = Bench::new();
        assert_eq!(bench.release(), ReleaseOutcome::NotHolding);
        let aim = AimRay::new(Vec3::ZERO, -Vec3::Z);
        bench
            .controller
            .fixed_update(&aim, DT, &mut bench.physics, &mut bench.zones);
        assert!(!bench.controller.is_holding());
    }

    #[test]
    fn surface_regime_rests_flush_on_table() {
        let mut bench = Bench::new().without_gravity();
        bench.add_table();
        let half = Vec3::new(0.05, 0.07, 0.05);
        let (_, body) = bench.add_cube(Vec3::new(0.0, 1.2, -0.5), half);
        bench.ready();

        let eye = Vec3::new(0.0, 1.6, 0.5);
        assert!(bench.grab(&aim_at(eye, Vec3::new(0.0, 1.2, -0.5))));

        let spot = Vec3::new(0.2, TABLE_TOP, -0.4);
        let aim = aim_at(eye, spot);
        bench.tick(&aim, 120);

        assert_eq!(bench.controller.regime(), Some(Regime::Surface));
        let p = bench.position(body);
        let expected_y = TABLE_TOP + half.y + bench.controller.config().surface_clearance;
        assert!((p.y - expected_y).abs() < 1e-3, "y = {}, expected {}", p.y, expected_y);
        assert!((p.x - spot.x).abs() < 1e-3);
        assert!((p.z - spot.z).abs() < 1e-3);
    }

    #[test]
    fn steep_surface_falls_back_to_free_regime() {
        let mut bench = Bench::new().without_gravity();
        // A ramp tilted 60 degrees: normal.y = 0.5, below the 0.6 threshold
        bench.physics.add_fixed(
            None,
            Pose::new(
                Vec3::new(0.0, 0.5, -2.0),
                Quat::from_rotation_x(60f32.to_radians()),
            ),
            ColliderShape::cuboid(Vec3::new(1.0, 0.05, 1.0)),
            CollisionGroup::surface(),
        );
        bench.add_cube(Vec3::new(0.0, 1.0, -0.6), Vec3::splat(0.05));
        bench.ready();

        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert!(bench.grab(&AimRay::new(eye, -Vec3::Z)));
        let aim = aim_at(eye, Vec3::new(0.0, 0.5, -2.0));
        bench.tick(&aim, 1);

        assert_eq!(bench.controller.regime(), Some(Regime::Free));
        let destination = bench.controller.destination().unwrap();
        assert!(destination.distance(eye) <= bench.controller.hold_distance() + 1e-4);
    }

    #[test]
    fn free_regime_holds_at_distance() {
        let mut bench = Bench::new().without_gravity();
        let (_, body) = bench.add_cube(Vec3::new(0.0, 1.0, -1.0), Vec3::splat(0.05));
        bench.ready();

        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);
        assert!(bench.grab(&aim));
        bench.tick(&aim, 120);

        assert_eq!(bench.controller.regime(), Some(Regime::Free));
        let expected = aim.point_at(bench.controller.hold_distance());
        assert!(bench.position(body).distance(expected) < 1e-3);
    }

    #[test]
    fn free_regime_stops_short_of_obstacles() {
        let mut bench = Bench::new().without_gravity();
        let wall_z = -0.9;
        bench.add_wall(wall_z);
        bench.add_cube(Vec3::new(0.0, 1.0, -0.5), Vec3::splat(0.05));
        bench.ready();

        let eye = Vec3::new(0.0, 1.0, 0.0);
        let aim = AimRay::new(eye, -Vec3::Z);
        assert!(bench.grab(&aim));
        bench.tick(&aim, 2);

        let config = bench.controller.config().clone();
        // Wall face is at |z| = 0.85, inside the 1.2 m hold distance
        let obstacle_distance = -wall_z - 0.05;
        let destination = bench.controller.destination().unwrap();
        let along = (destination - eye).dot(aim.direction);
        assert!(along <= obstacle_distance - config.probe_radius - config.probe_margin + 1e-4);
        assert!(along > 0.0);
    }

    #[test]
    fn zoom_is_monotonic_and_bounded() {
        let mut controller = ManipulationController::new(ManipulationConfig::default());
        let config = controller.config().clone();

        let mut last = controller.hold_distance();
        for _ in 0..600 {
            controller.zoom(false, true, DT);
            assert!(controller.hold_distance() >= last);
            assert!(controller.hold_distance() <= config.max_hold_distance);
            last = controller.hold_distance();
        }
        assert_eq!(last, config.max_hold_distance);

        for _ in 0..600 {
            controller.zoom(true, false, DT);
            assert!(controller.hold_distance() <= last);
            assert!(controller.hold_distance() >= config.min_hold_distance);
            last = controller.hold_distance();
        }
        assert_eq!(last, config.min_hold_distance);
    }

    #[test]
    fn zoom_only_applies_while_holding() {
        let mut bench = Bench::new();
        let input = ManipulationInput {
            zoom_out: true,
            aim_enabled: true,
            ..Default::default()
        };
        let before = bench.controller.hold_distance();
        let aim = AimRay::new(Vec3::ZERO, -Vec3::Z);
        bench.controller.update(
            &input,
            &aim,
            0.5,
            &bench.ecs,
            &mut bench.physics,
            &mut bench.zones,
        );
        assert_eq!(bench.controller.hold_distance(), before);
    }

    #[test]
    fn snaps_into_zone_when_released_in_range() {
        let mut bench = Bench::new().without_gravity();
        let radius = 0.15;
        let target = Vec3::new(0.0, 1.0, -1.0);
        let zone = bench.add_zone(target, radius);
        // Two radii from the target
        let (entity, body) = bench.add_cube(target + Vec3::X * 2.0 * radius, Vec3::splat(0.04));
        bench
            .ecs
            .insert_one(entity, ZoneAssignment::new(zone))
            .unwrap();
        bench.ready();
        let groups_before = bench.physics.collision_groups(body.collider.unwrap());

        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert!(bench.grab(&aim_at(eye, target + Vec3::X * 2.0 * radius)));
        assert!(bench.zones.get(zone).unwrap().is_engaged());

        // Aim so the held destination lands half a radius from the target
        let goal = target + Vec3::X * 0.5 * radius;
        let direction = (goal - eye).normalize();
        let aim = AimRay::new(eye, direction);
        while (bench.controller.hold_distance() - (goal - eye).length()).abs() > 1e-3 {
            let shorter = bench.controller.hold_distance() > (goal - eye).length();
            bench.controller.zoom(shorter, !shorter, 0.001);
        }
        bench.tick(&aim, 120);
        assert!(bench.position(body).distance(goal) < 0.5 * radius);
        assert!(bench.zones.get(zone).unwrap().is_highlighted());

        assert_eq!(bench.release(), ReleaseOutcome::Committed(zone));
        assert!(!bench.controller.is_holding());

        let pose = bench.physics.body_pose(body.rigid_body).unwrap();
        let zone_pose = bench.zones.get(zone).unwrap().target_pose();
        assert!(pose.position.distance(zone_pose.position) < 1e-5);
        assert!(pose.rotation.angle_between(zone_pose.rotation) < 1e-4);
        assert_eq!(bench.properties(body), SimulationProperties::LOCKED);
        assert_eq!(bench.physics.collision_groups(body.collider.unwrap()), groups_before);
        assert!(!bench.zones.get(zone).unwrap().is_engaged());
        assert_eq!(bench.zones.get(zone).unwrap().committed(), Some(entity));

        // The committed body stays put
        bench.tick(&aim, 30);
        let after = bench.physics.body_pose(body.rigid_body).unwrap();
        assert!(after.position.distance(zone_pose.position) < 1e-5);
    }

    #[test]
    fn regrabbing_a_seated_object_clears_the_commit() {
        let mut bench = Bench::new().without_gravity();
        let target = Vec3::new(0.0, 1.0, -1.0);
        let zone = bench.add_zone(target, 0.15);
        let (entity, body) = bench.add_cube(target + Vec3::X * 0.05, Vec3::splat(0.04));
        bench
            .ecs
            .insert_one(entity, ZoneAssignment::new(zone))
            .unwrap();
        bench.ready();
        // Hold one meter out so the carried cube sits on the target
        bench.controller.zoom(true, false, 0.25);

        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert!(bench.grab(&aim_at(eye, target + Vec3::X * 0.05)));
        bench.tick(&aim_at(eye, target), 5);
        assert_eq!(bench.release(), ReleaseOutcome::Committed(zone));
        assert_eq!(bench.zones.get(zone).unwrap().committed(), Some(entity));
        bench.ready();

        assert!(bench.grab(&aim_at(eye, target)));
        assert!(bench.zones.get(zone).unwrap().committed().is_none());
        bench.tick(&AimRay::new(eye, Vec3::new(1.0, 0.0, -0.3)), 120);
        assert!(bench.position(body).distance(target) > 0.45);

        assert_eq!(bench.release(), ReleaseOutcome::Restored);
        assert!(bench.zones.get(zone).unwrap().committed().is_none());
    }

    #[test]
    fn far_release_restores_without_teleport() {
        let mut bench = Bench::new().without_gravity();
        let radius = 0.15;
        let target = Vec3::new(0.0, 1.0, -1.0);
        let zone = bench.add_zone(target, radius);
        let (entity, body) = bench.add_cube(Vec3::new(0.3, 1.0, -1.0), Vec3::splat(0.04));
        bench
            .ecs
            .insert_one(entity, ZoneAssignment::new(zone))
            .unwrap();
        bench.ready();
        let before = bench.properties(body);

        let eye = Vec3::new(0.0, 1.0, 0.0);
        assert!(bench.grab(&aim_at(eye, Vec3::new(0.3, 1.0, -1.0))));
        // Swing the aim well away: the held object ends up over three radii out
        let aim = AimRay::new(eye, Vec3::new(1.0, 0.0, -0.3));
        bench.tick(&aim, 120);
        let resting = bench.position(body);
        assert!(resting.distance(target) > 3.0 * radius);

        assert_eq!(bench.release(), ReleaseOutcome::Restored);
        assert_eq!(bench.properties(body), before);
        assert_eq!(bench.position(body), resting);
        assert!(bench.zones.get(zone).unwrap().committed().is_none());
    }

    #[test]
    fn disabled_aim_forces_release_without_commit() {
        let mut bench = Bench::new().without_gravity();
        let target = Vec3::new(0.0, 1.0, -1.0);
        let zone = bench.add_zone(target, 10.0);
        let (entity, body) = bench.add_cube(target, Vec3::splat(0.04));
        bench
            .ecs
            .insert_one(entity, ZoneAssignment::new(zone))
            .unwrap();
        bench.ready();
        let before = bench.properties(body);

        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);
        let input = ManipulationInput {
            grab_pressed: true,
            aim_enabled: true,
            ..Default::default()
        };
        bench
            .controller
            .update(&input, &aim, DT, &bench.ecs, &mut bench.physics, &mut bench.zones);
        assert!(bench.controller.is_holding());
        bench.tick(&aim, 5);

        let unlocked = ManipulationInput::default();
        bench
            .controller
            .update(&unlocked, &aim, DT, &bench.ecs, &mut bench.physics, &mut bench.zones);
        assert!(!bench.controller.is_holding());
        assert_eq!(bench.properties(body), before);
        assert!(bench.zones.get(zone).unwrap().committed().is_none());
    }

    #[test]
    fn removed_body_ends_hold_quietly() {
        let mut bench = Bench::new().without_gravity();
        let (_, body) = bench.add_cube(Vec3::new(0.0, 1.0, -1.0), Vec3::splat(0.05));
        bench.ready();
        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);
        assert!(bench.grab(&aim));

        bench.physics.remove_body(body.rigid_body);
        bench.tick(&aim, 1);
        assert!(!bench.controller.is_holding());
        assert_eq!(bench.release(), ReleaseOutcome::NotHolding);
    }

    #[test]
    fn hold_distance_persists_across_holds() {
        let mut bench = Bench::new().without_gravity();
        bench.add_cube(Vec3::new(0.0, 1.0, -1.0), Vec3::splat(0.05));
        bench.ready();
        let aim = AimRay::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z);

        assert!(bench.grab(&aim));
        bench.controller.zoom(true, false, 0.5);
        let zoomed = bench.controller.hold_distance();
        bench.release();

        assert!(bench.grab(&aim));
        assert_eq!(bench.controller.hold_distance(), zoomed);
    }
}
