//! Bench scene: table, gearbox, control panel, telemetry board, loose parts
//! and the placement zones they belong to.
//!
//! All meshes are unit primitives or procgen parts scaled per instance, so
//! the mesh library only holds [`PartMesh::ALL`].

use crate::config::GameConfig;
use crate::gearbox::GearboxDrive;
use crate::panel::{ControlPanel, PanelControl, LAMP_INTENSITY};
use crate::telemetry::{Telemetry, BEACON_EMISSION, RPM_BAR_WIDTH, TORQUE_BAR_WIDTH};
use engine_core::{MeshInstance, Name, Pose, Tag, Tint};
use glam::{Quat, Vec2, Vec3};
use hecs::{Entity, World};
use interaction::{PlacementConfig, PlacementZone, ZoneAssignment, ZoneId, ZoneRegistry};
use physics::{ColliderShape, CollisionGroup, Interpolation, PhysicsWorld};
use procgen::{GearConfig, LeverConfig, PartKind, PartMeshGenerator, ScrewConfig};
use renderer::{MeshData, Vertex};
use std::f32::consts::FRAC_PI_2;

/// Tag carried by every object the viewer may pick up.
pub const GRABBABLE_TAG: &str = "Grabbable";

/// Height of the tabletop surface.
pub const TABLE_TOP_Y: f32 = 0.775;

const GEARBOX_ORIGIN: Vec3 = Vec3::new(-0.45, TABLE_TOP_Y, -0.2);
const PANEL_CENTER: Vec3 = Vec3::new(0.45, 0.86, 0.22);
const PANEL_HALF: Vec3 = Vec3::new(0.3, 0.12, 0.02);
const PANEL_TILT_DEGREES: f32 = -35.0;
const BOARD_CENTER: Vec3 = Vec3::new(0.55, 1.1, -0.25);

const STEEL: [f32; 4] = [0.62, 0.64, 0.68, 1.0];
const BRASS: [f32; 4] = [0.78, 0.62, 0.28, 1.0];
const DARK: [f32; 4] = [0.16, 0.17, 0.19, 1.0];
const WOOD: [f32; 4] = [0.45, 0.32, 0.2, 1.0];
const FLOOR: [f32; 4] = [0.3, 0.31, 0.33, 1.0];

/// Meshes every scene instance draws from. The discriminant is the mesh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartMesh {
    /// 1 m cube.
    Cube,
    /// Radius 0.5, height 1, along Y.
    Cylinder,
    /// Radius 0.5.
    Ball,
    Screw,
    Gear,
    Lever,
}

impl PartMesh {
    pub const ALL: [PartMesh; 6] = [
        PartMesh::Cube,
        PartMesh::Cylinder,
        PartMesh::Ball,
        PartMesh::Screw,
        PartMesh::Gear,
        PartMesh::Lever,
    ];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            PartMesh::Cube => "Cube Mesh",
            PartMesh::Cylinder => "Cylinder Mesh",
            PartMesh::Ball => "Ball Mesh",
            PartMesh::Screw => "Screw Mesh",
            PartMesh::Gear => "Gear Mesh",
            PartMesh::Lever => "Lever Mesh",
        }
    }

    fn kind(self) -> PartKind {
        match self {
            PartMesh::Cube => PartKind::Box {
                half_extents: Vec3::splat(0.5),
            },
            PartMesh::Cylinder => PartKind::Cylinder {
                radius: 0.5,
                half_height: 0.5,
                segments: 24,
            },
            PartMesh::Ball => PartKind::Ball {
                radius: 0.5,
                segments: 16,
            },
            PartMesh::Screw => PartKind::Screw(ScrewConfig::default()),
            PartMesh::Gear => PartKind::SpurGear(GearConfig::default()),
            PartMesh::Lever => PartKind::Lever(LeverConfig::default()),
        }
    }

    /// Generate the CPU-side mesh, ready for upload.
    pub fn mesh_data(self) -> MeshData {
        let part = PartMeshGenerator::generate(self.kind());
        let vertices = part
            .vertices
            .iter()
            .map(|v| Vertex::new(v.position, v.normal))
            .collect();
        MeshData::new(vertices, part.indices)
    }
}

/// What moves a scene part each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Screw,
    Gear1,
    Gear2,
    StartPlunger,
    StopPlunger,
    ResetPlunger,
    Knob,
    SwitchLever,
    RpmMarker,
    TorqueMarker,
}

/// Part posed from machine state: `base * drive * local_offset`.
#[derive(Debug, Clone, Copy)]
pub struct Animated {
    pub base: Pose,
    pub local_offset: Vec3,
    pub driver: Driver,
}

impl Animated {
    pub fn new(base: Pose, driver: Driver) -> Self {
        Self {
            base,
            local_offset: Vec3::ZERO,
            driver,
        }
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.local_offset = offset;
        self
    }

    pub fn pose(&self, gearbox: &GearboxDrive, panel: &ControlPanel, telemetry: &Telemetry) -> Pose {
        let (rotation, translation) = match self.driver {
            Driver::Screw => (gearbox.screw_rotation(), Vec3::ZERO),
            Driver::Gear1 => (gearbox.gear1_rotation(), Vec3::ZERO),
            Driver::Gear2 => (gearbox.gear2_rotation(), Vec3::ZERO),
            Driver::StartPlunger => (Quat::IDENTITY, Vec3::NEG_Y * panel.buttons.plunger_offsets().0),
            Driver::StopPlunger => (Quat::IDENTITY, Vec3::NEG_Y * panel.buttons.plunger_offsets().1),
            Driver::ResetPlunger => (Quat::IDENTITY, Vec3::NEG_Y * panel.reset.plunger_offset()),
            Driver::Knob => (
                Quat::from_rotation_y(-panel.knob.angle().to_radians()),
                Vec3::ZERO,
            ),
            Driver::SwitchLever => (panel.switch.lever_rotation(), Vec3::ZERO),
            Driver::RpmMarker => (
                Quat::IDENTITY,
                Vec3::X * telemetry.rpm.marker_offset(RPM_BAR_WIDTH),
            ),
            Driver::TorqueMarker => (
                Quat::IDENTITY,
                Vec3::X * telemetry.torque.marker_offset(TORQUE_BAR_WIDTH),
            ),
        };
        Pose::new(
            self.base.position + self.base.rotation * (translation + rotation * self.local_offset),
            self.base.rotation * rotation,
        )
    }
}

/// Which indicator an emissive part shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LampSource {
    Start,
    Stop,
    Reset,
    KnobRing,
    Forward,
    Reverse,
    Beacon,
    RpmMarker,
    TorqueMarker,
}

/// Emissive indicator: glows `color * intensity` while its source is on.
#[derive(Debug, Clone, Copy)]
pub struct Lamp {
    pub source: LampSource,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Lamp {
    pub fn new(source: LampSource, color: [f32; 3], intensity: f32) -> Self {
        Self {
            source,
            color,
            intensity,
        }
    }

    /// Current (base color, emission). Gauge markers take their color from
    /// the reading's zone.
    pub fn shade(&self, panel: &ControlPanel, telemetry: &Telemetry) -> ([f32; 3], [f32; 3]) {
        let scaled = |c: [f32; 3], k: f32| c.map(|x| x * k);
        let lit = match self.source {
            LampSource::Start => panel.buttons.start_lit(),
            LampSource::Stop => panel.buttons.stop_lit(),
            LampSource::Reset => panel.reset.is_flashing(),
            LampSource::KnobRing => panel.knob.is_enabled(),
            LampSource::Forward => panel.switch.forward_lit(),
            LampSource::Reverse => panel.switch.reverse_lit(),
            LampSource::Beacon => telemetry.beacon.is_lit(),
            LampSource::RpmMarker => {
                let c = telemetry.rpm.zone().color();
                return (c, scaled(c, self.intensity));
            }
            LampSource::TorqueMarker => {
                let c = telemetry.torque.zone().color();
                return (c, scaled(c, self.intensity));
            }
        };
        if lit {
            (self.color, scaled(self.color, self.intensity))
        } else {
            (scaled(self.color, 0.35), [0.0; 3])
        }
    }
}

/// Visual marker that glows with its zone's highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneMarker(pub ZoneId);

/// Handles the game loop needs after the scene is built.
#[derive(Debug, Clone)]
pub struct Scene {
    pub beacon_position: Vec3,
    pub grabbables: Vec<Entity>,
}

/// Pose the animated parts and shade the lamps from current machine state.
pub fn animate(
    world: &mut World,
    gearbox: &GearboxDrive,
    panel: &ControlPanel,
    telemetry: &Telemetry,
    zones: &ZoneRegistry,
) {
    for (_, (pose, animated)) in world.query_mut::<(&mut Pose, &Animated)>() {
        *pose = animated.pose(gearbox, panel, telemetry);
    }
    for (_, (tint, lamp)) in world.query_mut::<(&mut Tint, &Lamp)>() {
        let (base, emission) = lamp.shade(panel, telemetry);
        tint.base = [base[0], base[1], base[2], tint.base[3]];
        tint.emission = emission;
    }
    for (_, (tint, marker)) in world.query_mut::<(&mut Tint, &ZoneMarker)>() {
        tint.emission = zones.get(marker.0).map_or([0.0; 3], |zone| zone.emission());
    }
}

fn panel_rotation() -> Quat {
    Quat::from_rotation_x(PANEL_TILT_DEGREES.to_radians())
}

/// Point on the panel face, `lift` meters out along its normal.
fn panel_point(local: Vec2, lift: f32) -> Vec3 {
    PANEL_CENTER + panel_rotation() * Vec3::new(local.x, local.y, PANEL_HALF.z + lift)
}

/// Orientation whose local Y is the panel normal.
fn panel_normal_rotation() -> Quat {
    panel_rotation() * Quat::from_rotation_x(FRAC_PI_2)
}

fn cube_scale(half_extents: Vec3) -> Vec3 {
    half_extents * 2.0
}

fn cylinder_scale(radius: f32, half_height: f32) -> Vec3 {
    Vec3::new(radius * 2.0, half_height * 2.0, radius * 2.0)
}

struct Builder<'a> {
    world: &'a mut World,
    physics: &'a mut PhysicsWorld,
}

impl Builder<'_> {
    fn visual(&mut self, name: &str, mesh: PartMesh, pose: Pose, scale: Vec3, color: [f32; 4]) -> Entity {
        self.world.spawn((
            Name::new(name),
            pose,
            MeshInstance::new(mesh.id(), scale),
            Tint::solid(color),
        ))
    }

    /// Static box that blocks and, with `CollisionGroup::surface()`, supports.
    fn fixed_box(
        &mut self,
        name: &str,
        pose: Pose,
        half_extents: Vec3,
        groups: physics::InteractionGroups,
        color: [f32; 4],
    ) -> Entity {
        let entity = self.world.reserve_entity();
        let body = self
            .physics
            .add_fixed(Some(entity), pose, ColliderShape::cuboid(half_extents), groups);
        self.world.spawn_at(
            entity,
            (
                Name::new(name),
                pose,
                MeshInstance::new(PartMesh::Cube.id(), cube_scale(half_extents)),
                Tint::solid(color),
                body,
            ),
        );
        entity
    }

    /// Loose dynamic object with an interpolated render pose.
    fn grabbable(
        &mut self,
        name: &str,
        mesh: PartMesh,
        pose: Pose,
        scale: Vec3,
        shape: ColliderShape,
        color: [f32; 4],
    ) -> Entity {
        let entity = self.world.reserve_entity();
        let body = self
            .physics
            .add_dynamic(Some(entity), pose, shape, CollisionGroup::interactable());
        self.physics
            .set_interpolation(body.rigid_body, Interpolation::Interpolate);
        self.world.spawn_at(
            entity,
            (
                Name::new(name),
                Tag::new(GRABBABLE_TAG),
                MeshInstance::new(mesh.id(), scale),
                Tint::solid(color),
                body,
            ),
        );
        entity
    }

    /// Panel button: a cap that is both the click target and the lamp.
    fn button(&mut self, name: &str, control: PanelControl, at: Vec2, driver: Driver, lamp: Lamp) {
        let (radius, half_height) = (0.025, 0.012);
        let pose = Pose::new(panel_point(at, half_height), panel_normal_rotation());
        let entity = self.world.reserve_entity();
        let body = self.physics.add_fixed(
            Some(entity),
            pose,
            ColliderShape::Cylinder { half_height, radius },
            CollisionGroup::panel(),
        );
        let color = [lamp.color[0], lamp.color[1], lamp.color[2], 1.0];
        self.world.spawn_at(
            entity,
            (
                Name::new(name),
                pose,
                Animated::new(pose, driver),
                MeshInstance::new(PartMesh::Cylinder.id(), cylinder_scale(radius, half_height)),
                Tint::solid(color),
                lamp,
                control,
                body,
            ),
        );
    }

    /// Invisible click target for controls whose visuals move.
    fn hit_box(&mut self, name: &str, control: PanelControl, pose: Pose, half_extents: Vec3) {
        let entity = self.world.reserve_entity();
        let body = self.physics.add_fixed(
            Some(entity),
            pose,
            ColliderShape::cuboid(half_extents),
            CollisionGroup::panel(),
        );
        self.world.spawn_at(entity, (Name::new(name), control, body));
    }

    /// Placement zone: glowing pad, capture sensor and registry entry.
    fn zone(
        &mut self,
        zones: &mut ZoneRegistry,
        name: &str,
        target: Pose,
        pad_radius: f32,
        config: &PlacementConfig,
        only: Option<Entity>,
    ) -> ZoneId {
        let capture_radius = (config.acceptance_radius * 2.0).max(0.05);
        let sensor = self.physics.add_sensor(
            None,
            target,
            ColliderShape::Ball {
                radius: capture_radius,
            },
            CollisionGroup::zone(),
        );
        let mut zone = PlacementZone::from_config(name, target, config).with_volume(sensor);
        if let Some(entity) = only {
            zone = zone.with_only_entity(entity);
        }
        let id = zones.add(zone);

        let pad = Pose::from_position(Vec3::new(target.position.x, TABLE_TOP_Y + 0.002, target.position.z));
        self.world.spawn((
            Name::new(format!("{name}_pad")),
            pad,
            MeshInstance::new(PartMesh::Cylinder.id(), cylinder_scale(pad_radius, 0.002)),
            Tint::solid([0.2, 0.35, 0.25, 1.0]),
            ZoneMarker(id),
        ));
        id
    }
}

/// Populate `world`, `physics` and `zones` with the bench.
pub fn build(
    world: &mut World,
    physics: &mut PhysicsWorld,
    zones: &mut ZoneRegistry,
    config: &GameConfig,
) -> Scene {
    let mut b = Builder { world, physics };

    // Floor and furniture
    b.physics.add_ground_plane();
    b.visual(
        "floor",
        PartMesh::Cube,
        Pose::from_position(Vec3::new(0.0, -0.01, 0.0)),
        Vec3::new(12.0, 0.02, 12.0),
        FLOOR,
    );
    let table_half = Vec3::new(0.9, 0.025, 0.5);
    b.fixed_box(
        "table",
        Pose::from_position(Vec3::new(0.0, TABLE_TOP_Y - table_half.y, 0.0)),
        table_half,
        CollisionGroup::surface(),
        WOOD,
    );
    for (x, z) in [(-0.85, -0.45), (0.85, -0.45), (-0.85, 0.45), (0.85, 0.45)] {
        let leg_half = Vec3::new(0.03, (TABLE_TOP_Y - 0.05) * 0.5, 0.03);
        b.fixed_box(
            "table_leg",
            Pose::from_position(Vec3::new(x, leg_half.y, z)),
            leg_half,
            CollisionGroup::environment(),
            WOOD,
        );
    }
    let shelf_half = Vec3::new(0.3, 0.02, 0.3);
    b.fixed_box(
        "shelf",
        Pose::from_position(Vec3::new(1.4, 0.5, 0.0)),
        shelf_half,
        CollisionGroup::surface(),
        WOOD,
    );
    b.fixed_box(
        "shelf_post",
        Pose::from_position(Vec3::new(1.4, 0.24, 0.0)),
        Vec3::new(0.04, 0.24, 0.04),
        CollisionGroup::environment(),
        DARK,
    );

    // Gearbox
    let axle_z = Quat::from_rotation_x(FRAC_PI_2);
    let axle_x = Quat::from_rotation_z(-FRAC_PI_2);
    b.fixed_box(
        "gearbox_base",
        Pose::from_position(GEARBOX_ORIGIN + Vec3::new(0.2, 0.015, 0.0)),
        Vec3::new(0.4, 0.015, 0.15),
        CollisionGroup::environment(),
        DARK,
    );
    b.fixed_box(
        "gearbox_frame",
        Pose::from_position(GEARBOX_ORIGIN + Vec3::new(0.2, 0.22, -0.05)),
        Vec3::new(0.36, 0.19, 0.015),
        CollisionGroup::environment(),
        STEEL,
    );
    let gear_height = 0.33;
    for (name, offset, driver) in [
        ("gear_1", Vec3::new(0.0, gear_height, 0.0), Driver::Gear1),
        ("gear_2", Vec3::new(0.40, gear_height, 0.0), Driver::Gear2),
    ] {
        let pose = Pose::new(GEARBOX_ORIGIN + offset, axle_z);
        let entity = b.visual(name, PartMesh::Gear, pose, Vec3::ONE, BRASS);
        let _ = b.world.insert_one(entity, Animated::new(pose, driver));
    }
    let screw_pose = Pose::new(GEARBOX_ORIGIN + Vec3::new(0.0, 0.105, 0.0), axle_x);
    let screw = b.visual("screw", PartMesh::Screw, screw_pose, Vec3::ONE, STEEL);
    let _ = b.world.insert_one(screw, Animated::new(screw_pose, Driver::Screw));

    // Cover pieces share one name so the visibility toggle catches all of them.
    let cover = [0.55, 0.6, 0.65, 1.0];
    b.visual(
        "housing_cover",
        PartMesh::Cube,
        Pose::from_position(GEARBOX_ORIGIN + Vec3::new(0.2, 0.6, 0.0)),
        cube_scale(Vec3::new(0.44, 0.015, 0.13)),
        cover,
    );
    for x in [-0.24, 0.64] {
        b.visual(
            "housing_cover",
            PartMesh::Cube,
            Pose::from_position(GEARBOX_ORIGIN + Vec3::new(x, 0.3, 0.0)),
            cube_scale(Vec3::new(0.015, 0.3, 0.13)),
            cover,
        );
    }

    // Control panel
    b.fixed_box(
        "control_panel",
        Pose::new(PANEL_CENTER, panel_rotation()),
        PANEL_HALF,
        CollisionGroup::environment(),
        DARK,
    );
    b.button(
        "start_button",
        PanelControl::Start,
        Vec2::new(-0.22, 0.04),
        Driver::StartPlunger,
        Lamp::new(LampSource::Start, [0.1, 0.85, 0.2], LAMP_INTENSITY),
    );
    b.button(
        "stop_button",
        PanelControl::Stop,
        Vec2::new(-0.12, 0.04),
        Driver::StopPlunger,
        Lamp::new(LampSource::Stop, [0.9, 0.12, 0.1], LAMP_INTENSITY),
    );
    b.button(
        "reset_button",
        PanelControl::Reset,
        Vec2::new(-0.02, 0.04),
        Driver::ResetPlunger,
        Lamp::new(LampSource::Reset, [0.2, 0.45, 0.95], LAMP_INTENSITY),
    );

    let knob_at = Vec2::new(0.1, 0.0);
    let knob_base = Pose::new(panel_point(knob_at, 0.0), panel_normal_rotation());
    let (knob_radius, knob_half) = (0.035, 0.015);
    let knob_pose = Pose::new(panel_point(knob_at, knob_half), knob_base.rotation);
    b.world.spawn((
        Name::new("speed_knob"),
        knob_pose,
        Animated::new(knob_base, Driver::Knob).with_offset(Vec3::Y * knob_half),
        MeshInstance::new(PartMesh::Cylinder.id(), cylinder_scale(knob_radius, knob_half)),
        Tint::solid(DARK),
    ));
    b.world.spawn((
        Name::new("speed_knob_pointer"),
        knob_pose,
        Animated::new(knob_base, Driver::Knob).with_offset(Vec3::new(0.0, knob_half * 2.0 + 0.004, -0.02)),
        MeshInstance::new(PartMesh::Cube.id(), cube_scale(Vec3::new(0.004, 0.004, 0.016))),
        Tint::solid([0.95, 0.95, 0.95, 1.0]),
    ));
    b.world.spawn((
        Name::new("speed_knob_ring"),
        Pose::new(panel_point(knob_at, 0.003), knob_base.rotation),
        MeshInstance::new(PartMesh::Cylinder.id(), cylinder_scale(0.048, 0.003)),
        Tint::solid([0.1, 0.8, 0.9, 1.0]),
        Lamp::new(LampSource::KnobRing, [0.1, 0.8, 0.9], 3.0),
    ));
    b.hit_box(
        "speed_knob_hit",
        PanelControl::Knob,
        Pose::new(panel_point(knob_at, knob_half), knob_base.rotation),
        Vec3::new(knob_radius, knob_half, knob_radius),
    );

    let switch_at = Vec2::new(0.22, 0.02);
    let switch_base = Pose::new(panel_point(switch_at, 0.015), panel_normal_rotation());
    b.world.spawn((
        Name::new("direction_switch"),
        switch_base,
        Animated::new(switch_base, Driver::SwitchLever),
        MeshInstance::new(PartMesh::Lever.id(), Vec3::ONE),
        Tint::solid(STEEL),
    ));
    b.hit_box(
        "direction_switch_hit",
        PanelControl::Switch,
        Pose::new(panel_point(switch_at, 0.06), switch_base.rotation),
        Vec3::new(0.035, 0.06, 0.035),
    );
    for (name, at, lamp) in [
        ("forward_led", Vec2::new(0.19, -0.08), Lamp::new(LampSource::Forward, [0.1, 0.9, 0.2], LAMP_INTENSITY)),
        ("reverse_led", Vec2::new(0.25, -0.08), Lamp::new(LampSource::Reverse, [0.95, 0.55, 0.05], LAMP_INTENSITY)),
    ] {
        b.world.spawn((
            Name::new(name),
            Pose::new(panel_point(at, 0.005), panel_rotation()),
            MeshInstance::new(PartMesh::Ball.id(), Vec3::splat(0.02)),
            Tint::solid([lamp.color[0], lamp.color[1], lamp.color[2], 1.0]),
            lamp,
        ));
    }

    // Telemetry board
    let board_half = Vec3::new(0.3, 0.16, 0.015);
    b.fixed_box(
        "telemetry_board",
        Pose::from_position(BOARD_CENTER),
        board_half,
        CollisionGroup::environment(),
        DARK,
    );
    b.fixed_box(
        "telemetry_post",
        Pose::from_position(Vec3::new(BOARD_CENTER.x, (TABLE_TOP_Y + BOARD_CENTER.y - board_half.y) * 0.5, BOARD_CENTER.z)),
        Vec3::new(0.02, (BOARD_CENTER.y - board_half.y - TABLE_TOP_Y) * 0.5, 0.02),
        CollisionGroup::environment(),
        STEEL,
    );
    for (name, y, width, driver, source) in [
        ("rpm", 0.06, RPM_BAR_WIDTH, Driver::RpmMarker, LampSource::RpmMarker),
        ("torque", -0.05, TORQUE_BAR_WIDTH, Driver::TorqueMarker, LampSource::TorqueMarker),
    ] {
        let bar = BOARD_CENTER + Vec3::new(0.0, y, board_half.z + 0.004);
        b.visual(
            &format!("{name}_bar"),
            PartMesh::Cube,
            Pose::from_position(bar),
            Vec3::new(width, 0.025, 0.008),
            [0.05, 0.05, 0.06, 1.0],
        );
        let marker_base = Pose::from_position(bar + Vec3::Z * 0.006);
        b.world.spawn((
            Name::new(format!("{name}_marker")),
            marker_base,
            Animated::new(marker_base, driver),
            MeshInstance::new(PartMesh::Cube.id(), Vec3::new(0.008, 0.04, 0.012)),
            Tint::solid([0.1, 0.9, 0.2, 1.0]),
            Lamp::new(source, [0.1, 0.9, 0.2], 1.5),
        ));
    }
    let beacon_position = BOARD_CENTER + Vec3::new(0.25, board_half.y + 0.04, 0.0);
    b.world.spawn((
        Name::new("beacon"),
        Pose::from_position(beacon_position),
        MeshInstance::new(PartMesh::Ball.id(), Vec3::splat(0.07)),
        Tint::solid([0.95, 0.3, 0.05, 1.0]),
        Lamp::new(LampSource::Beacon, [0.95, 0.3, 0.05], BEACON_EMISSION),
    ));

    // Loose parts and their zones
    let gear_scale = 0.5;
    let gear = GearConfig::default();
    let gear_half_height = gear.thickness * 0.5 * gear_scale;
    let spare_gear = b.grabbable(
        "spare_gear",
        PartMesh::Gear,
        Pose::from_position(Vec3::new(-0.75, TABLE_TOP_Y + gear_half_height + 0.01, 0.35)),
        Vec3::splat(gear_scale),
        ColliderShape::Cylinder {
            half_height: gear_half_height,
            radius: gear.tip_radius * gear_scale,
        },
        BRASS,
    );
    let block_half = 0.04;
    let block = b.grabbable(
        "block",
        PartMesh::Cube,
        Pose::from_position(Vec3::new(0.0, TABLE_TOP_Y + block_half + 0.01, 0.05)),
        Vec3::splat(block_half * 2.0),
        ColliderShape::cuboid(Vec3::splat(block_half)),
        [0.3, 0.5, 0.85, 1.0],
    );
    let spare_half = 0.03;
    let spare_block = b.grabbable(
        "spare_block",
        PartMesh::Cube,
        Pose::from_position(Vec3::new(0.1, TABLE_TOP_Y + spare_half + 0.01, -0.0)),
        Vec3::splat(spare_half * 2.0),
        ColliderShape::cuboid(Vec3::splat(spare_half)),
        [0.85, 0.45, 0.3, 1.0],
    );

    let gear_slot = b.zone(
        zones,
        "gear_slot",
        Pose::from_position(Vec3::new(-0.3, TABLE_TOP_Y + gear_half_height + 0.001, 0.3)),
        gear.tip_radius * gear_scale + 0.02,
        &config.placement,
        Some(spare_gear),
    );
    let block_pad = b.zone(
        zones,
        "block_pad",
        Pose::from_position(Vec3::new(-0.6, TABLE_TOP_Y + block_half + 0.001, 0.1)),
        0.07,
        &config.placement,
        None,
    );
    let _ = b.world.insert_one(spare_gear, ZoneAssignment::new(gear_slot));
    let _ = b.world.insert_one(block, ZoneAssignment::new(block_pad));

    log::info!(
        "Scene built: {} entities, {} placement zones",
        b.world.len(),
        zones.len()
    );

    Scene {
        beacon_position,
        grabbables: vec![spare_gear, block, spare_block],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GearboxConfig;
    use physics::QueryMask;

    struct Fixture {
        world: World,
        physics: PhysicsWorld,
        zones: ZoneRegistry,
        scene: Scene,
    }

    fn fixture() -> Fixture {
        let mut world = World::new();
        let mut physics = PhysicsWorld::new();
        let mut zones = ZoneRegistry::new();
        let scene = build(&mut world, &mut physics, &mut zones, &GameConfig::default());
        physics.update_query_pipeline();
        Fixture {
            world,
            physics,
            zones,
            scene,
        }
    }

    #[test]
    fn mesh_ids_follow_declaration_order() {
        for (index, mesh) in PartMesh::ALL.iter().enumerate() {
            assert_eq!(mesh.id() as usize, index);
        }
        let gear = PartMesh::Gear.mesh_data();
        assert!(!gear.vertices.is_empty());
        assert_eq!(gear.indices.len() % 3, 0);
    }

    #[test]
    fn grabbables_are_tagged_and_two_are_assigned() {
        let f = fixture();
        assert_eq!(f.zones.len(), 2);
        let mut assigned = 0;
        for &entity in &f.scene.grabbables {
            let tag = f.world.get::<&Tag>(entity).unwrap();
            assert_eq!(tag.as_str(), GRABBABLE_TAG);
            if let Ok(assignment) = f.world.get::<&ZoneAssignment>(entity) {
                assert!(assignment.zone.is_some());
                assigned += 1;
            }
        }
        assert_eq!(assigned, 2);
    }

    #[test]
    fn every_panel_control_is_clickable() {
        let f = fixture();
        let mut found = Vec::new();
        for (_, control) in f.world.query::<&PanelControl>().iter() {
            found.push(*control);
        }
        for control in [
            PanelControl::Start,
            PanelControl::Stop,
            PanelControl::Reset,
            PanelControl::Knob,
            PanelControl::Switch,
        ] {
            assert!(found.contains(&control), "missing {:?}", control);
        }
    }

    #[test]
    fn ray_onto_start_button_hits_it() {
        let f = fixture();
        let target = panel_point(Vec2::new(-0.22, 0.04), 0.012);
        let normal = panel_rotation() * Vec3::Z;
        let origin = target + normal * 0.5;
        let hit = f
            .physics
            .raycast(origin, -normal, 1.0, QueryMask::new(CollisionGroup::mask(&[CollisionGroup::Panel])))
            .expect("panel hit");
        let entity = f.physics.collider_entity(hit.collider).unwrap();
        assert_eq!(*f.world.get::<&PanelControl>(entity).unwrap(), PanelControl::Start);
    }

    #[test]
    fn animate_turns_gears_and_lights_lamps() {
        let mut f = fixture();
        let mut gearbox = GearboxDrive::new(&GearboxConfig::default());
        let mut panel = ControlPanel::new(&GameConfig::default().panel, &gearbox);
        let mut telemetry = Telemetry::new(&GameConfig::default().telemetry);

        panel.press(PanelControl::Start, &mut gearbox);
        gearbox.update(0.25);
        panel.update(0.016, &gearbox, false);
        telemetry.update(&gearbox, 0.1);
        animate(&mut f.world, &gearbox, &panel, &telemetry, &f.zones);

        let mut gear1 = None;
        let mut start_emission = None;
        for (_, (name, pose, tint)) in f.world.query::<(&Name, &Pose, &Tint)>().iter() {
            match name.as_str() {
                "gear_1" => gear1 = Some(*pose),
                "start_button" => start_emission = Some(tint.emission),
                _ => {}
            }
        }
        let expected = Quat::from_rotation_x(FRAC_PI_2) * Quat::from_rotation_y(FRAC_PI_2);
        assert!(gear1.unwrap().rotation.angle_between(expected) < 1e-3);
        assert!(start_emission.unwrap()[1] > 1.0);
    }

    #[test]
    fn loose_parts_rest_on_the_table() {
        let mut f = fixture();
        for _ in 0..120 {
            f.physics.step();
        }
        for &entity in &f.scene.grabbables {
            let body = *f.world.get::<&physics::PhysicsBody>(entity).unwrap();
            let pose = f.physics.body_pose(body.rigid_body).unwrap();
            assert!(pose.position.y > TABLE_TOP_Y, "{:?} fell through", entity);
            assert!(pose.position.y < TABLE_TOP_Y + 0.1);
        }
    }
}
