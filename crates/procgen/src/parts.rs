//! Procedural meshes for the machine parts on the bench: housings, shafts,
//! the drive screw, spur gears and switch levers.
//!
//! Every part is built around the local origin with Y as the rotation axis,
//! matching the physics engine's cylinder convention.

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::TAU;

/// Vertex with position, normal and UV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl PartVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
        }
    }
}

/// Generated mesh data, ready to be converted to GPU vertices.
#[derive(Debug, Clone, Default)]
pub struct PartMeshData {
    pub vertices: Vec<PartVertex>,
    pub indices: Vec<u32>,
}

impl PartMeshData {
    /// Axis-aligned bounds `(min, max)` in local space.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        if self.vertices.is_empty() {
            return (Vec3::ZERO, Vec3::ZERO);
        }
        self.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        )
    }

    /// Half extents of [`bounds`](Self::bounds), used to size colliders.
    pub fn half_extents(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (max - min) * 0.5
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Spur gear dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearConfig {
    pub teeth: u32,
    pub root_radius: f32,
    pub tip_radius: f32,
    pub thickness: f32,
    /// Fraction of each tooth pitch occupied by the tooth top (0..1).
    pub tip_fraction: f32,
}

impl Default for GearConfig {
    fn default() -> Self {
        Self {
            teeth: 16,
            root_radius: 0.18,
            tip_radius: 0.22,
            thickness: 0.05,
            tip_fraction: 0.35,
        }
    }
}

/// Threaded drive screw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrewConfig {
    pub radius: f32,
    pub length: f32,
    pub thread_pitch: f32,
    pub thread_depth: f32,
}

impl Default for ScrewConfig {
    fn default() -> Self {
        Self {
            radius: 0.04,
            length: 0.6,
            thread_pitch: 0.05,
            thread_depth: 0.012,
        }
    }
}

/// Panel switch lever: hub block, arm and ball grip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeverConfig {
    pub hub_half_extents: Vec3,
    pub arm_length: f32,
    pub arm_radius: f32,
    pub grip_radius: f32,
}

impl Default for LeverConfig {
    fn default() -> Self {
        Self {
            hub_half_extents: Vec3::new(0.03, 0.015, 0.03),
            arm_length: 0.09,
            arm_radius: 0.008,
            grip_radius: 0.016,
        }
    }
}

/// Part families the generator knows how to build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartKind {
    Box { half_extents: Vec3 },
    Cylinder { radius: f32, half_height: f32, segments: u32 },
    Ball { radius: f32, segments: u32 },
    Screw(ScrewConfig),
    SpurGear(GearConfig),
    Lever(LeverConfig),
}

/// Procedural part mesh generator.
#[derive(Debug, Default)]
pub struct PartMeshGenerator {
    vertices: Vec<PartVertex>,
    indices: Vec<u32>,
}

impl PartMeshGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one part from scratch.
    pub fn generate(kind: PartKind) -> PartMeshData {
        let mut generator = Self::new();
        match kind {
            PartKind::Box { half_extents } => generator.add_box(Vec3::ZERO, half_extents),
            PartKind::Cylinder {
                radius,
                half_height,
                segments,
            } => generator.add_cylinder(Vec3::ZERO, radius, half_height, segments),
            PartKind::Ball { radius, segments } => {
                generator.add_sphere(Vec3::ZERO, radius, segments)
            }
            PartKind::Screw(config) => generator.add_screw(&config),
            PartKind::SpurGear(config) => generator.add_spur_gear(&config),
            PartKind::Lever(config) => generator.add_lever(&config),
        }
        generator.finish()
    }

    pub fn finish(self) -> PartMeshData {
        PartMeshData {
            vertices: self.vertices,
            indices: self.indices,
        }
    }

    fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.next_index();
        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        for (corner, uv) in corners.into_iter().zip(uvs) {
            self.vertices.push(PartVertex::new(corner, normal, uv));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned box with flat-shaded faces.
    pub fn add_box(&mut self, center: Vec3, half: Vec3) {
        let (x, y, z) = (half.x, half.y, half.z);
        let c = center;
        // +X, -X, +Y, -Y, +Z, -Z (counter-clockwise seen from outside)
        self.push_quad(
            [
                c + Vec3::new(x, -y, z),
                c + Vec3::new(x, -y, -z),
                c + Vec3::new(x, y, -z),
                c + Vec3::new(x, y, z),
            ],
            Vec3::X,
        );
        self.push_quad(
            [
                c + Vec3::new(-x, -y, -z),
                c + Vec3::new(-x, -y, z),
                c + Vec3::new(-x, y, z),
                c + Vec3::new(-x, y, -z),
            ],
            Vec3::NEG_X,
        );
        self.push_quad(
            [
                c + Vec3::new(-x, y, z),
                c + Vec3::new(x, y, z),
                c + Vec3::new(x, y, -z),
                c + Vec3::new(-x, y, -z),
            ],
            Vec3::Y,
        );
        self.push_quad(
            [
                c + Vec3::new(-x, -y, -z),
                c + Vec3::new(x, -y, -z),
                c + Vec3::new(x, -y, z),
                c + Vec3::new(-x, -y, z),
            ],
            Vec3::NEG_Y,
        );
        self.push_quad(
            [
                c + Vec3::new(-x, -y, z),
                c + Vec3::new(x, -y, z),
                c + Vec3::new(x, y, z),
                c + Vec3::new(-x, y, z),
            ],
            Vec3::Z,
        );
        self.push_quad(
            [
                c + Vec3::new(x, -y, -z),
                c + Vec3::new(-x, -y, -z),
                c + Vec3::new(-x, y, -z),
                c + Vec3::new(x, y, -z),
            ],
            Vec3::NEG_Z,
        );
    }

    /// Flat cap at height `y` from a closed ring of points.
    fn add_cap(&mut self, center: Vec3, ring: &[Vec3], up: bool) {
        let normal = if up { Vec3::Y } else { Vec3::NEG_Y };
        let hub = self.next_index();
        self.vertices
            .push(PartVertex::new(center, normal, Vec2::splat(0.5)));
        for p in ring {
            let d = *p - center;
            self.vertices.push(PartVertex::new(
                *p,
                normal,
                Vec2::new(0.5 + d.x, 0.5 + d.z),
            ));
        }
        let n = ring.len() as u32;
        for i in 0..n {
            let a = hub + 1 + i;
            let b = hub + 1 + (i + 1) % n;
            if up {
                self.indices.extend_from_slice(&[hub, b, a]);
            } else {
                self.indices.extend_from_slice(&[hub, a, b]);
            }
        }
    }

    /// Cylinder along Y with smooth sides and flat caps.
    pub fn add_cylinder(&mut self, center: Vec3, radius: f32, half_height: f32, segments: u32) {
        let segments = segments.max(3);
        let base = self.next_index();
        for ring in 0..2 {
            let y = if ring == 0 { -half_height } else { half_height };
            for seg in 0..=segments {
                let angle = seg as f32 / segments as f32 * TAU;
                let dir = Vec3::new(angle.cos(), 0.0, angle.sin());
                self.vertices.push(PartVertex::new(
                    center + dir * radius + Vec3::Y * y,
                    dir,
                    Vec2::new(seg as f32 / segments as f32, ring as f32),
                ));
            }
        }
        let stride = segments + 1;
        for seg in 0..segments {
            let bottom = base + seg;
            let top = bottom + stride;
            self.indices
                .extend_from_slice(&[bottom, top, bottom + 1, bottom + 1, top, top + 1]);
        }

        let ring = |y: f32| -> Vec<Vec3> {
            (0..segments)
                .map(|seg| {
                    let angle = seg as f32 / segments as f32 * TAU;
                    center + Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
                })
                .collect()
        };
        self.add_cap(center + Vec3::Y * half_height, &ring(half_height), true);
        self.add_cap(center - Vec3::Y * half_height, &ring(-half_height), false);
    }

    /// UV sphere.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32, segments: u32) {
        let segments = segments.max(3);
        let rings = (segments / 2).max(2);
        let base = self.next_index();
        for ring in 0..=rings {
            let phi = ring as f32 / rings as f32 * std::f32::consts::PI;
            for seg in 0..=segments {
                let theta = seg as f32 / segments as f32 * TAU;
                let normal = Vec3::new(
                    phi.sin() * theta.cos(),
                    phi.cos(),
                    phi.sin() * theta.sin(),
                );
                self.vertices.push(PartVertex::new(
                    center + normal * radius,
                    normal,
                    Vec2::new(seg as f32 / segments as f32, ring as f32 / rings as f32),
                ));
            }
        }
        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = base + ring * stride + seg;
                let b = a + stride;
                self.indices
                    .extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
    }

    /// Shaft whose radius rides a helix, giving the look of a single-start thread.
    pub fn add_screw(&mut self, config: &ScrewConfig) {
        const SEGMENTS: u32 = 16;
        let rings_per_pitch = 8.0;
        let pitch = config.thread_pitch.max(1e-3);
        let rings = ((config.length / pitch) * rings_per_pitch).ceil().max(2.0) as u32;
        let half = config.length * 0.5;
        let base = self.next_index();

        for ring in 0..=rings {
            let t = ring as f32 / rings as f32;
            let y = -half + t * config.length;
            for seg in 0..=SEGMENTS {
                let angle = seg as f32 / SEGMENTS as f32 * TAU;
                let phase = (y / pitch) * TAU - angle;
                let r = config.radius + config.thread_depth * (0.5 + 0.5 * phase.sin());
                let dir = Vec3::new(angle.cos(), 0.0, angle.sin());
                self.vertices.push(PartVertex::new(
                    dir * r + Vec3::Y * y,
                    dir,
                    Vec2::new(seg as f32 / SEGMENTS as f32, t),
                ));
            }
        }
        let stride = SEGMENTS + 1;
        for ring in 0..rings {
            for seg in 0..SEGMENTS {
                let bottom = base + ring * stride + seg;
                let top = bottom + stride;
                self.indices
                    .extend_from_slice(&[bottom, top, bottom + 1, bottom + 1, top, top + 1]);
            }
        }

        let cap = |y: f32| -> Vec<Vec3> {
            (0..SEGMENTS)
                .map(|seg| {
                    let angle = seg as f32 / SEGMENTS as f32 * TAU;
                    Vec3::new(angle.cos() * config.radius, y, angle.sin() * config.radius)
                })
                .collect()
        };
        self.add_cap(Vec3::Y * half, &cap(half), true);
        self.add_cap(Vec3::NEG_Y * half, &cap(-half), false);
    }

    /// Gear outline in the XZ plane, four points per tooth.
    pub fn gear_profile(config: &GearConfig) -> Vec<Vec3> {
        let teeth = config.teeth.max(3);
        let pitch = TAU / teeth as f32;
        let tip = config.tip_fraction.clamp(0.05, 0.9) * pitch;
        let flank = (pitch - tip) * 0.25;
        let point = |angle: f32, r: f32| Vec3::new(angle.cos() * r, 0.0, angle.sin() * r);

        let mut profile = Vec::with_capacity(teeth as usize * 4);
        for tooth in 0..teeth {
            let start = tooth as f32 * pitch;
            profile.push(point(start, config.root_radius));
            profile.push(point(start + flank, config.tip_radius));
            profile.push(point(start + flank + tip, config.tip_radius));
            profile.push(point(start + 2.0 * flank + tip, config.root_radius));
        }
        profile
    }

    /// Extruded spur gear: flat side walls per profile edge plus two caps.
    pub fn add_spur_gear(&mut self, config: &GearConfig) {
        let profile = Self::gear_profile(config);
        let h = config.thickness * 0.5;
        let n = profile.len();

        for i in 0..n {
            let a = profile[i];
            let b = profile[(i + 1) % n];
            let edge = b - a;
            if edge.length_squared() < 1e-12 {
                continue;
            }
            // Angles grow from +X towards +Z, so outward is Y x edge.
            let normal = Vec3::Y.cross(edge).normalize_or_zero();
            self.push_quad(
                [
                    b - Vec3::Y * h,
                    a - Vec3::Y * h,
                    a + Vec3::Y * h,
                    b + Vec3::Y * h,
                ],
                normal,
            );
        }

        let top: Vec<Vec3> = profile.iter().map(|p| *p + Vec3::Y * h).collect();
        let bottom: Vec<Vec3> = profile.iter().map(|p| *p - Vec3::Y * h).collect();
        self.add_cap(Vec3::Y * h, &top, true);
        self.add_cap(Vec3::NEG_Y * h, &bottom, false);
    }

    /// Lever standing up from a hub, grip at the top. Pivot at the origin.
    pub fn add_lever(&mut self, config: &LeverConfig) {
        let hub = config.hub_half_extents;
        self.add_box(Vec3::ZERO, hub);
        let arm_half = config.arm_length * 0.5;
        self.add_cylinder(
            Vec3::Y * (hub.y + arm_half),
            config.arm_radius,
            arm_half,
            10,
        );
        self.add_sphere(
            Vec3::Y * (hub.y + config.arm_length + config.grip_radius * 0.5),
            config.grip_radius,
            12,
        );
    }

    /// Append another mesh transformed by `transform`.
    pub fn append(&mut self, mesh: &PartMeshData, transform: Mat4) {
        let base = self.next_index();
        for v in &mesh.vertices {
            let position = transform.transform_point3(Vec3::from(v.position));
            let normal = transform
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero();
            self.vertices
                .push(PartVertex::new(position, normal, Vec2::from(v.uv)));
        }
        self.indices.extend(mesh.indices.iter().map(|i| base + i));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices_in_range(mesh: &PartMeshData) -> bool {
        let n = mesh.vertices.len() as u32;
        mesh.indices.iter().all(|&i| i < n)
    }

    #[test]
    fn box_bounds_match_half_extents() {
        let half = Vec3::new(0.1, 0.2, 0.3);
        let mesh = PartMeshGenerator::generate(PartKind::Box { half_extents: half });
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert!((mesh.half_extents() - half).length() < 1e-6);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn box_faces_wind_outward() {
        let mesh = PartMeshGenerator::generate(PartKind::Box {
            half_extents: Vec3::ONE,
        });
        for tri in mesh.indices.chunks(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(mesh.vertices[i as usize].position))
                .collect();
            let face_normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let stored = Vec3::from(mesh.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(stored) > 0.0);
        }
    }

    #[test]
    fn cylinder_spans_height_and_radius() {
        let mesh = PartMeshGenerator::generate(PartKind::Cylinder {
            radius: 0.5,
            half_height: 1.0,
            segments: 24,
        });
        let half = mesh.half_extents();
        assert!((half.y - 1.0).abs() < 1e-5);
        assert!((half.x - 0.5).abs() < 1e-3);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn gear_profile_has_four_points_per_tooth_within_radii() {
        let config = GearConfig {
            teeth: 12,
            ..Default::default()
        };
        let profile = PartMeshGenerator::gear_profile(&config);
        assert_eq!(profile.len(), 48);
        for p in &profile {
            let r = p.length();
            assert!(r >= config.root_radius - 1e-5 && r <= config.tip_radius + 1e-5);
        }
    }

    #[test]
    fn gear_extent_is_tip_radius_and_thickness() {
        let config = GearConfig::default();
        let mesh = PartMeshGenerator::generate(PartKind::SpurGear(config));
        let half = mesh.half_extents();
        assert!((half.y - config.thickness * 0.5).abs() < 1e-5);
        assert!(half.x <= config.tip_radius + 1e-5);
        assert!(half.x > config.root_radius);
        assert!(indices_in_range(&mesh));
    }

    #[test]
    fn screw_thread_stays_between_core_and_crest() {
        let config = ScrewConfig::default();
        let mesh = PartMeshGenerator::generate(PartKind::Screw(config));
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            let r = Vec2::new(p.x, p.z).length();
            assert!(r <= config.radius + config.thread_depth + 1e-5);
        }
        assert!((mesh.half_extents().y - config.length * 0.5).abs() < 1e-5);
    }

    #[test]
    fn lever_rises_above_pivot() {
        let config = LeverConfig::default();
        let mesh = PartMeshGenerator::generate(PartKind::Lever(config));
        let (min, max) = mesh.bounds();
        assert!((min.y + config.hub_half_extents.y).abs() < 1e-5);
        assert!(max.y > config.hub_half_extents.y + config.arm_length);
    }

    #[test]
    fn append_offsets_indices() {
        let part = PartMeshGenerator::generate(PartKind::Box {
            half_extents: Vec3::splat(0.5),
        });
        let mut generator = PartMeshGenerator::new();
        generator.append(&part, Mat4::IDENTITY);
        generator.append(&part, Mat4::from_translation(Vec3::X * 2.0));
        let combined = generator.finish();
        assert_eq!(combined.vertices.len(), 48);
        assert!(indices_in_range(&combined));
        assert!((combined.bounds().1.x - 2.5).abs() < 1e-5);
    }

    #[test]
    fn empty_mesh_has_zero_bounds() {
        let mesh = PartMeshData::default();
        assert_eq!(mesh.bounds(), (Vec3::ZERO, Vec3::ZERO));
    }
}
