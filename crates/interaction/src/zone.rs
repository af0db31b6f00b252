//! Placement zones: target poses that carried objects snap into.

use crate::config::{PlacementConfig, TagPolicy};
use crate::holdable::Holdable;
use engine_core::Pose;
use glam::Vec3;
use hecs::Entity;
use physics::{ColliderHandle, LockedAxes, RigidBodyType, SimulationProperties};

/// An object as seen by a zone's capture volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateInfo<'a> {
    pub entity: Entity,
    pub tag: Option<&'a str>,
    pub position: Vec3,
}

/// The object a zone currently considers for commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub entity: Entity,
    /// Last position reported by the capture volume.
    pub position: Vec3,
}

/// Interface the controller uses to talk to a zone.
pub trait Zone {
    fn target_pose(&self) -> Pose;

    /// Mark the zone's assigned object as carried (`Some`) or put down (`None`).
    fn set_engaged(&mut self, held: Option<Entity>);

    /// `entity` left the zone's target pose; forget that it was committed.
    fn uncommit(&mut self, entity: Entity);

    /// A candidate exists and its last known position is within range.
    fn is_candidate_in_range(&self) -> bool;

    /// Acceptance test at release: `entity` is the candidate and
    /// `position` is within the acceptance radius.
    fn accepts(&self, entity: Entity, position: Vec3) -> bool;

    /// Commit the current candidate, measured at `body`'s pose.
    fn commit_candidate(&mut self, body: &mut dyn Holdable) -> bool;

    /// Adopt `entity` as candidate (subject to filters) and commit it if in range.
    fn try_commit(&mut self, entity: Entity, tag: Option<&str>, body: &mut dyn Holdable) -> bool;
}

/// A target pose plus acceptance radius.
#[derive(Debug, Clone)]
pub struct PlacementZone {
    name: String,
    target: Pose,
    acceptance_radius: f32,
    volume: Option<ColliderHandle>,
    only_entity: Option<Entity>,
    required_tag: Option<String>,
    tag_policy: TagPolicy,
    highlight_color: [f32; 3],
    emission_intensity: f32,
    locked: SimulationProperties,
    candidate: Option<Candidate>,
    engaged: Option<Entity>,
    highlighted: bool,
    committed: Option<Entity>,
}

impl PlacementZone {
    pub fn new(name: impl Into<String>, target: Pose, acceptance_radius: f32) -> Self {
        let name = name.into();
        let acceptance_radius = if acceptance_radius >= 0.0 {
            acceptance_radius
        } else {
            log::warn!(
                "Zone '{}': acceptance radius {} is negative, using 0",
                name,
                acceptance_radius
            );
            0.0
        };
        Self {
            name,
            target,
            acceptance_radius,
            volume: None,
            only_entity: None,
            required_tag: None,
            tag_policy: TagPolicy::Permissive,
            highlight_color: [0.0, 1.0, 0.0],
            emission_intensity: 3.0,
            locked: SimulationProperties::LOCKED,
            candidate: None,
            engaged: None,
            highlighted: false,
            committed: None,
        }
    }

    /// Zone with radius, tag filter, highlight and lock behaviour from config.
    pub fn from_config(name: impl Into<String>, target: Pose, config: &PlacementConfig) -> Self {
        let locked = if config.lock_after_commit {
            SimulationProperties::LOCKED
        } else {
            SimulationProperties {
                body_type: RigidBodyType::Dynamic,
                locked_axes: LockedAxes::empty(),
                ..SimulationProperties::LOCKED
            }
        };
        Self::new(name, target, config.acceptance_radius)
            .with_tag_filter(config.required_tag.clone(), config.tag_policy)
            .with_highlight(config.highlight_color, config.emission_intensity)
            .with_locked_properties(locked)
    }

    pub fn with_volume(mut self, volume: ColliderHandle) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Only `entity` may become a candidate.
    pub fn with_only_entity(mut self, entity: Entity) -> Self {
        self.only_entity = Some(entity);
        self
    }

    pub fn with_tag_filter(mut self, tag: Option<String>, policy: TagPolicy) -> Self {
        self.required_tag = tag.filter(|t| !t.is_empty());
        self.tag_policy = policy;
        self
    }

    pub fn with_highlight(mut self, color: [f32; 3], intensity: f32) -> Self {
        self.highlight_color = color;
        self.emission_intensity = intensity;
        self
    }

    pub fn with_locked_properties(mut self, locked: SimulationProperties) -> Self {
        self.locked = locked;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acceptance_radius(&self) -> f32 {
        self.acceptance_radius
    }

    pub fn volume(&self) -> Option<ColliderHandle> {
        self.volume
    }

    pub fn candidate(&self) -> Option<Candidate> {
        self.candidate
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.is_some()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn committed(&self) -> Option<Entity> {
        self.committed
    }

    pub fn locked_properties(&self) -> &SimulationProperties {
        &self.locked
    }

    /// Emissive color for the zone marker.
    pub fn emission(&self) -> [f32; 3] {
        if self.highlighted {
            self.highlight_color.map(|c| c * self.emission_intensity)
        } else {
            [0.0; 3]
        }
    }

    fn in_range(&self, position: Vec3) -> bool {
        position.distance(self.target.position) <= self.acceptance_radius
    }

    fn passes_filters(&self, entity: Entity, tag: Option<&str>) -> bool {
        if self.only_entity.is_some_and(|only| only != entity) {
            return false;
        }
        match (&self.required_tag, self.tag_policy) {
            (None, _) | (Some(_), TagPolicy::Permissive) => true,
            (Some(required), TagPolicy::Strict) => tag == Some(required.as_str()),
        }
    }

    /// Lit only while the carried object itself is the in-range candidate.
    fn refresh_highlight(&mut self) {
        let highlighted = self.engaged.is_some_and(|held| {
            self.candidate
                .is_some_and(|c| c.entity == held && self.in_range(c.position))
        });
        if highlighted != self.highlighted {
            log::debug!(
                "Zone '{}': {}",
                self.name,
                if highlighted { "in range" } else { "out of range" }
            );
            self.highlighted = highlighted;
        }
    }

    pub fn on_volume_enter(&mut self, info: CandidateInfo<'_>) {
        self.on_volume_stay(info);
    }

    pub fn on_volume_stay(&mut self, info: CandidateInfo<'_>) {
        if !self.passes_filters(info.entity, info.tag) {
            return;
        }
        self.candidate = Some(Candidate {
            entity: info.entity,
            position: info.position,
        });
        self.refresh_highlight();
    }

    pub fn on_volume_exit(&mut self, entity: Entity) {
        if self.candidate.is_some_and(|c| c.entity == entity) {
            self.candidate = None;
        }
        self.refresh_highlight();
    }

    /// Drop any reference to an entity that no longer exists.
    pub fn forget(&mut self, entity: Entity) {
        if self.candidate.is_some_and(|c| c.entity == entity) {
            log::warn!("Zone '{}': candidate {:?} vanished", self.name, entity);
            self.candidate = None;
        }
        if self.committed == Some(entity) {
            self.committed = None;
        }
        self.refresh_highlight();
    }

    fn commit(&mut self, entity: Entity, body: &mut dyn Holdable) {
        body.teleport(self.target);
        body.apply_locked_config(&self.locked);
        self.candidate = Some(Candidate {
            entity,
            position: self.target.position,
        });
        if self.committed != Some(entity) {
            log::info!("Zone '{}': committed {:?}", self.name, entity);
        }
        self.committed = Some(entity);
        self.highlighted = false;
    }
}

impl Zone for PlacementZone {
    fn target_pose(&self) -> Pose {
        self.target
    }

    fn set_engaged(&mut self, held: Option<Entity>) {
        self.engaged = held;
        if held.is_some() {
            self.refresh_highlight();
        } else {
            self.highlighted = false;
        }
    }

    fn uncommit(&mut self, entity: Entity) {
        if self.committed == Some(entity) {
            log::info!("Zone '{}': {:?} picked back up", self.name, entity);
            self.committed = None;
        }
    }

    fn is_candidate_in_range(&self) -> bool {
        self.candidate.is_some_and(|c| self.in_range(c.position))
    }

    fn accepts(&self, entity: Entity, position: Vec3) -> bool {
        self.candidate.is_some_and(|c| c.entity == entity) && self.in_range(position)
    }

    fn commit_candidate(&mut self, body: &mut dyn Holdable) -> bool {
        let Some(candidate) = self.candidate else {
            return false;
        };
        if !self.in_range(body.pose().position) {
            return false;
        }
        self.commit(candidate.entity, body);
        true
    }

    fn try_commit(&mut self, entity: Entity, tag: Option<&str>, body: &mut dyn Holdable) -> bool {
        if !self.passes_filters(entity, tag) {
            return false;
        }
        self.candidate = Some(Candidate {
            entity,
            position: body.pose().position,
        });
        let committed = self.commit_candidate(body);
        self.highlighted = false;
        committed
    }
}
