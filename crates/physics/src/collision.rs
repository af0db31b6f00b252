//! Collision groups, classification masks and entity links.

use hecs::Entity;
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

/// Classification of colliders in the scene. Raycasts and sweeps are
/// filtered by masks built from these.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionGroup {
    /// Static scenery: floor, walls, machine housing
    Environment = 1 << 0,
    /// Tops that loose objects can rest on (tables, shelves)
    Surface = 1 << 1,
    /// Loose objects the viewer may pick up
    Interactable = 1 << 2,
    /// The object currently carried by the viewer
    Held = 1 << 3,
    /// Placement zone capture volumes
    Zone = 1 << 4,
    /// Clickable panel controls
    Panel = 1 << 5,
}

impl CollisionGroup {
    pub fn group(self) -> Group {
        Group::from_bits_retain(self as u32)
    }

    /// Union of `groups` as a query mask. An empty slice yields an empty
    /// mask, which makes every masked query miss.
    pub fn mask(groups: &[CollisionGroup]) -> Group {
        groups
            .iter()
            .fold(Group::NONE, |acc, g| acc | g.group())
    }

    /// Static scenery that blocks the view and carried objects.
    pub fn environment() -> InteractionGroups {
        InteractionGroups::new(Self::Environment.group(), Group::ALL)
    }

    /// Tabletops: both a resting surface and an obstacle.
    pub fn surface() -> InteractionGroups {
        InteractionGroups::new(
            Self::Surface.group() | Self::Environment.group(),
            Group::ALL,
        )
    }

    /// Loose objects at rest.
    pub fn interactable() -> InteractionGroups {
        InteractionGroups::new(Self::Interactable.group(), Group::ALL)
    }

    /// The carried object; only capture volumes need to see it.
    pub fn held() -> InteractionGroups {
        InteractionGroups::new(Self::Held.group(), Self::Zone.group())
    }

    /// Placement zone capture volumes.
    pub fn zone() -> InteractionGroups {
        InteractionGroups::new(
            Self::Zone.group(),
            Self::Interactable.group() | Self::Held.group(),
        )
    }

    /// Buttons, knob and switch on the control panel.
    pub fn panel() -> InteractionGroups {
        InteractionGroups::new(Self::Panel.group(), Group::ALL)
    }
}

/// Component linking an ECS entity to its physics handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub rigid_body: RigidBodyHandle,
    pub collider: Option<ColliderHandle>,
}

impl PhysicsBody {
    pub fn new(rigid_body: RigidBodyHandle) -> Self {
        Self {
            rigid_body,
            collider: None,
        }
    }

    pub fn with_collider(rigid_body: RigidBodyHandle, collider: ColliderHandle) -> Self {
        Self {
            rigid_body,
            collider: Some(collider),
        }
    }
}

/// Encode an entity into rapier's `user_data`. Zero means "no entity".
pub fn entity_to_user_data(entity: Entity) -> u128 {
    entity.to_bits().get() as u128
}

/// Decode an entity stored with [`entity_to_user_data`].
pub fn entity_from_user_data(user_data: u128) -> Option<Entity> {
    u64::try_from(user_data).ok().and_then(Entity::from_bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mask_is_none() {
        assert_eq!(CollisionGroup::mask(&[]), Group::NONE);
    }

    #[test]
    fn mask_combines_groups() {
        let mask = CollisionGroup::mask(&[CollisionGroup::Surface, CollisionGroup::Environment]);
        assert!(mask.contains(CollisionGroup::Surface.group()));
        assert!(mask.contains(CollisionGroup::Environment.group()));
        assert!(!mask.contains(CollisionGroup::Held.group()));
    }

    #[test]
    fn entity_round_trips_through_user_data() {
        let mut world = hecs::World::new();
        let e = world.spawn(());
        assert_eq!(entity_from_user_data(entity_to_user_data(e)), Some(e));
        assert_eq!(entity_from_user_data(0), None);
    }
}
