//! Masked ray, sweep and overlap queries.

use crate::PhysicsWorld;
use engine_core::Vec3;
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

/// Which colliders a query may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryMask {
    pub groups: Group,
    pub exclude_body: Option<RigidBodyHandle>,
    pub include_sensors: bool,
}

impl QueryMask {
    /// Match colliders in any of `groups`, sensors included.
    pub fn new(groups: Group) -> Self {
        Self {
            groups,
            exclude_body: None,
            include_sensors: true,
        }
    }

    pub fn excluding(mut self, body: RigidBodyHandle) -> Self {
        self.exclude_body = Some(body);
        self
    }

    pub fn solids_only(mut self) -> Self {
        self.include_sensors = false;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn filter(&self) -> QueryFilter<'static> {
        let mut filter =
            QueryFilter::new().groups(InteractionGroups::new(Group::ALL, self.groups));
        if !self.include_sensors {
            filter = filter.exclude_sensors();
        }
        if let Some(body) = self.exclude_body {
            filter = filter.exclude_rigid_body(body);
        }
        filter
    }
}

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
    /// World position of the hit.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
}

/// First contact of a swept sphere.
#[derive(Debug, Clone, Copy)]
pub struct SweepHit {
    pub collider: ColliderHandle,
    /// Distance travelled by the sphere centre before contact.
    pub distance: f32,
}

fn make_ray(origin: Vec3, direction: Vec3) -> Ray {
    Ray::new(
        point![origin.x, origin.y, origin.z],
        vector![direction.x, direction.y, direction.z],
    )
}

fn make_hit(ray: &Ray, collider: ColliderHandle, intersection: RayIntersection) -> RaycastHit {
    let point = ray.point_at(intersection.time_of_impact);
    RaycastHit {
        collider,
        distance: intersection.time_of_impact,
        point: Vec3::new(point.x, point.y, point.z),
        normal: Vec3::new(
            intersection.normal.x,
            intersection.normal.y,
            intersection.normal.z,
        ),
    }
}

impl PhysicsWorld {
    /// Cast a ray and return the nearest hit within `mask`.
    /// `direction` must be normalized for `distance` to be in meters.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: QueryMask,
    ) -> Option<RaycastHit> {
        if mask.is_empty() {
            return None;
        }
        let ray = make_ray(origin, direction);

        self.query_pipeline
            .cast_ray_and_get_normal(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                mask.filter(),
            )
            .map(|(collider, intersection)| make_hit(&ray, collider, intersection))
    }

    /// Cast a ray and return all hits up to max_distance, nearest first.
    pub fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: QueryMask,
    ) -> Vec<RaycastHit> {
        let mut hits = Vec::new();
        if mask.is_empty() {
            return hits;
        }
        let ray = make_ray(origin, direction);

        self.query_pipeline.intersections_with_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            mask.filter(),
            |collider, intersection: RayIntersection| {
                hits.push(make_hit(&ray, collider, intersection));
                true // Continue searching
            },
        );

        // Sort by distance (use unwrap_or to avoid panic on NaN)
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits
    }

    /// Sweep a sphere along `direction` and return the first contact.
    pub fn sphere_cast(
        &self,
        origin: Vec3,
        direction: Vec3,
        radius: f32,
        max_distance: f32,
        mask: QueryMask,
    ) -> Option<SweepHit> {
        if mask.is_empty() || radius <= 0.0 {
            return None;
        }
        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(origin.x, origin.y, origin.z);
        let shape_vel = vector![direction.x, direction.y, direction.z];
        let options = ShapeCastOptions::with_max_time_of_impact(max_distance);

        self.query_pipeline
            .cast_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &shape_pos,
                &shape_vel,
                &shape,
                options,
                mask.filter(),
            )
            .map(|(collider, hit)| SweepHit {
                collider,
                distance: hit.time_of_impact,
            })
    }

    /// Colliders in `mask` overlapping the volume of `collider`.
    pub fn overlapping_colliders(
        &self,
        collider: ColliderHandle,
        mask: QueryMask,
    ) -> Vec<ColliderHandle> {
        let mut results = Vec::new();
        if mask.is_empty() {
            return results;
        }
        let Some(volume) = self.collider_set.get(collider) else {
            return results;
        };
        let filter = mask.filter().exclude_collider(collider);

        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            volume.position(),
            volume.shape(),
            filter,
            |hit| {
                results.push(hit);
                true // Continue searching
            },
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColliderShape, CollisionGroup};
    use engine_core::Pose;

    fn world_with_table() -> (PhysicsWorld, ColliderHandle) {
        let mut world = PhysicsWorld::new();
        let table = world.add_fixed(
            None,
            Pose::from_position(Vec3::new(0.0, 0.75, 0.0)),
            ColliderShape::cuboid(Vec3::new(1.0, 0.05, 0.5)),
            CollisionGroup::surface(),
        );
        world.update_query_pipeline();
        (world, table.collider.unwrap())
    }

    #[test]
    fn raycast_hits_table_top_with_up_normal() {
        let (world, table) = world_with_table();
        let mask = QueryMask::new(CollisionGroup::mask(&[CollisionGroup::Surface]));
        let hit = world
            .raycast(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 10.0, mask)
            .unwrap();
        assert_eq!(hit.collider, table);
        assert!((hit.point.y - 0.8).abs() < 1e-4);
        assert!(hit.normal.y > 0.99);
    }

    #[test]
    fn empty_mask_never_hits() {
        let (world, _) = world_with_table();
        let mask = QueryMask::new(Group::NONE);
        assert!(world.raycast(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 10.0, mask).is_none());
        assert!(world
            .sphere_cast(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 0.1, 10.0, mask)
            .is_none());
    }

    #[test]
    fn mask_filters_out_other_groups() {
        let (world, _) = world_with_table();
        let mask = QueryMask::new(CollisionGroup::mask(&[CollisionGroup::Interactable]));
        assert!(world.raycast(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 10.0, mask).is_none());
    }

    #[test]
    fn sphere_cast_stops_radius_short_of_surface() {
        let (world, _) = world_with_table();
        let mask = QueryMask::new(CollisionGroup::mask(&[CollisionGroup::Environment]));
        let hit = world
            .sphere_cast(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y, 0.1, 10.0, mask)
            .unwrap();
        assert!((hit.distance - 1.1).abs() < 1e-3);
    }

    #[test]
    fn sensor_volume_reports_overlaps() {
        let mut world = PhysicsWorld::new();
        let sensor = world.add_sensor(
            None,
            Pose::IDENTITY,
            ColliderShape::cuboid(Vec3::splat(0.2)),
            CollisionGroup::zone(),
        );
        let inside = world.add_dynamic(
            None,
            Pose::from_position(Vec3::new(0.1, 0.0, 0.0)),
            ColliderShape::Ball { radius: 0.05 },
            CollisionGroup::interactable(),
        );
        world.add_dynamic(
            None,
            Pose::from_position(Vec3::new(3.0, 0.0, 0.0)),
            ColliderShape::Ball { radius: 0.05 },
            CollisionGroup::interactable(),
        );
        world.update_query_pipeline();

        let mask = QueryMask::new(CollisionGroup::mask(&[CollisionGroup::Interactable]));
        let overlaps = world.overlapping_colliders(sensor, mask);
        assert_eq!(overlaps, vec![inside.collider.unwrap()]);
    }
}
