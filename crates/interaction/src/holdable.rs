//! Capability interface for objects the controller and zones can move.

use engine_core::Pose;
use glam::Vec3;
use physics::{BodyMut, SimulationProperties};

/// What the manipulation code needs from a carried object.
pub trait Holdable {
    fn pose(&self) -> Pose;

    /// World-space bounding half extents.
    fn half_extents(&self) -> Vec3;

    /// Current simulation properties, or `None` if the object is gone.
    fn simulation_snapshot(&self) -> Option<SimulationProperties>;

    fn apply_snapshot(&mut self, properties: &SimulationProperties);

    /// Apply a zone's locked configuration after a commit.
    fn apply_locked_config(&mut self, locked: &SimulationProperties) {
        self.apply_snapshot(locked);
    }

    /// Move towards `pose` over the next simulation step.
    fn drive_to(&mut self, pose: Pose);

    /// Place at `pose` immediately.
    fn teleport(&mut self, pose: Pose);
}

impl Holdable for BodyMut<'_> {
    fn pose(&self) -> Pose {
        BodyMut::pose(self)
    }

    fn half_extents(&self) -> Vec3 {
        BodyMut::half_extents(self)
    }

    fn simulation_snapshot(&self) -> Option<SimulationProperties> {
        self.simulation_properties()
    }

    fn apply_snapshot(&mut self, properties: &SimulationProperties) {
        self.apply_simulation_properties(properties);
    }

    fn drive_to(&mut self, pose: Pose) {
        BodyMut::drive_to(self, pose);
    }

    fn teleport(&mut self, pose: Pose) {
        BodyMut::teleport(self, pose);
    }
}
