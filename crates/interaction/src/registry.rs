//! Zone storage and capture-volume tracking.

use std::collections::HashSet;

use crate::zone::{CandidateInfo, PlacementZone};
use engine_core::Tag;
use hecs::Entity;
use physics::{CollisionGroup, PhysicsWorld, QueryMask};

/// Index of a zone in the [`ZoneRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneId(pub usize);

/// Component: the placement zone (if any) an object belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneAssignment {
    pub zone: Option<ZoneId>,
}

impl ZoneAssignment {
    pub fn new(zone: ZoneId) -> Self {
        Self { zone: Some(zone) }
    }
}

struct Entry {
    zone: PlacementZone,
    inside: HashSet<Entity>,
}

/// Owns every placement zone for the lifetime of the scene.
#[derive(Default)]
pub struct ZoneRegistry {
    entries: Vec<Entry>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, zone: PlacementZone) -> ZoneId {
        let id = ZoneId(self.entries.len());
        log::debug!("Registered zone '{}' as {:?}", zone.name(), id);
        self.entries.push(Entry {
            zone,
            inside: HashSet::new(),
        });
        id
    }

    pub fn get(&self, id: ZoneId) -> Option<&PlacementZone> {
        self.entries.get(id.0).map(|e| &e.zone)
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut PlacementZone> {
        self.entries.get_mut(id.0).map(|e| &mut e.zone)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &PlacementZone)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (ZoneId(i), &e.zone))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Query every capture volume and turn the change in overlapping
    /// objects since the last call into enter/stay/exit notifications.
    pub fn sync_volumes(&mut self, physics: &PhysicsWorld, ecs: &hecs::World) {
        let mask = QueryMask::new(CollisionGroup::mask(&[
            CollisionGroup::Interactable,
            CollisionGroup::Held,
        ]));

        for entry in &mut self.entries {
            let Some(volume) = entry.zone.volume() else {
                continue;
            };

            let mut now_inside = HashSet::new();
            for collider in physics.overlapping_colliders(volume, mask) {
                let Some(entity) = physics.collider_entity(collider) else {
                    continue;
                };
                if !ecs.contains(entity) || !now_inside.insert(entity) {
                    continue;
                }
                let position = physics
                    .collider_parent(collider)
                    .and_then(|body| physics.body_pose(body))
                    .map(|pose| pose.position)
                    .unwrap_or_default();
                let tag = ecs.get::<&Tag>(entity).ok();
                let info = CandidateInfo {
                    entity,
                    tag: tag.as_deref().map(Tag::as_str),
                    position,
                };
                if entry.inside.contains(&entity) {
                    entry.zone.on_volume_stay(info);
                } else {
                    entry.zone.on_volume_enter(info);
                }
            }

            for gone in entry.inside.difference(&now_inside) {
                if ecs.contains(*gone) {
                    entry.zone.on_volume_exit(*gone);
                } else {
                    entry.zone.forget(*gone);
                }
            }
            entry.inside = now_inside;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Zone;
    use engine_core::{Pose, Vec3};
    use physics::ColliderShape;

    struct Scene {
        ecs: hecs::World,
        physics: PhysicsWorld,
        zones: ZoneRegistry,
        zone: ZoneId,
    }

    fn scene() -> Scene {
        let mut physics = PhysicsWorld::new();
        let target = Pose::from_position(Vec3::new(0.0, 1.0, 0.0));
        let volume = physics.add_sensor(
            None,
            target,
            ColliderShape::cuboid(Vec3::splat(0.3)),
            CollisionGroup::zone(),
        );
        let mut zones = ZoneRegistry::new();
        let zone = zones.add(PlacementZone::new("socket", target, 0.15).with_volume(volume));
        Scene {
            ecs: hecs::World::new(),
            physics,
            zones,
            zone,
        }
    }

    fn spawn_ball(s: &mut Scene, position: Vec3) -> (Entity, physics::PhysicsBody) {
        let entity = s.ecs.spawn((Tag::new("Grabbable"),));
        let body = s.physics.add_kinematic(
            Some(entity),
            Pose::from_position(position),
            ColliderShape::Ball { radius: 0.05 },
            CollisionGroup::interactable(),
        );
        s.ecs.insert_one(entity, body).unwrap();
        (entity, body)
    }

    #[test]
    fn overlap_changes_become_enter_and_exit() {
        let mut s = scene();
        let (ball, body) = spawn_ball(&mut s, Vec3::new(0.1, 1.0, 0.0));
        s.physics.update_query_pipeline();

        s.zones.sync_volumes(&s.physics, &s.ecs);
        let zone = s.zones.get(s.zone).unwrap();
        assert_eq!(zone.candidate().map(|c| c.entity), Some(ball));
        assert!(zone.is_candidate_in_range());

        s.physics.teleport(body.rigid_body, Pose::from_position(Vec3::new(5.0, 1.0, 0.0)));
        s.physics.step();
        s.zones.sync_volumes(&s.physics, &s.ecs);
        assert!(s.zones.get(s.zone).unwrap().candidate().is_none());
    }

    #[test]
    fn stay_refreshes_candidate_position() {
        let mut s = scene();
        let (_, body) = spawn_ball(&mut s, Vec3::new(0.25, 1.0, 0.0));
        s.physics.update_query_pipeline();
        s.zones.sync_volumes(&s.physics, &s.ecs);
        assert!(!s.zones.get(s.zone).unwrap().is_candidate_in_range());

        s.physics.set_kinematic_position(body.rigid_body, Vec3::new(0.05, 1.0, 0.0));
        s.physics.step();
        s.zones.sync_volumes(&s.physics, &s.ecs);
        assert!(s.zones.get(s.zone).unwrap().is_candidate_in_range());
    }

    #[test]
    fn despawned_candidate_is_forgotten() {
        let mut s = scene();
        let (ball, body) = spawn_ball(&mut s, Vec3::new(0.0, 1.0, 0.0));
        s.physics.update_query_pipeline();
        s.zones.sync_volumes(&s.physics, &s.ecs);
        assert!(s.zones.get(s.zone).unwrap().candidate().is_some());

        s.ecs.despawn(ball).unwrap();
        s.physics.remove_body(body.rigid_body);
        s.physics.update_query_pipeline();
        s.zones.sync_volumes(&s.physics, &s.ecs);
        assert!(s.zones.get(s.zone).unwrap().candidate().is_none());
    }

    #[test]
    fn lookup_by_id() {
        let s = scene();
        assert_eq!(s.zones.get(s.zone).map(|z| z.name()), Some("socket"));
        assert_eq!(s.zones.len(), 1);
        assert!(s.zones.get(ZoneId(7)).is_none());
    }
}
