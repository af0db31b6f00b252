//! Physics system using Rapier3D for Gearbench.

pub mod body;
pub mod collision;
pub mod physics_world;
pub mod properties;
pub mod raycast;

pub use body::*;
pub use collision::*;
pub use physics_world::*;
pub use properties::*;
pub use raycast::*;

// Re-export Rapier for downstream crates
pub use rapier3d;

// Re-export common Rapier types
pub use rapier3d::prelude::{ColliderHandle, Group, InteractionGroups, LockedAxes, RigidBodyHandle, RigidBodyType};
