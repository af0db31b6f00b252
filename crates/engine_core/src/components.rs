//! Common ECS components used across the scene.

use glam::Vec3;

/// Human-readable name, used in logs and for config lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free-form classification label (e.g. `"Grabbable"`), checked by
/// placement zone tag filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Mesh reference component - links entity to a mesh for rendering.
#[derive(Debug, Clone, Copy)]
pub struct MeshInstance {
    pub mesh_id: u32,
    /// Render scale applied on top of the entity's pose.
    pub scale: Vec3,
}

impl MeshInstance {
    pub fn new(mesh_id: u32, scale: Vec3) -> Self {
        Self { mesh_id, scale }
    }
}

/// Base color and emissive glow for an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub base: [f32; 4],
    pub emission: [f32; 3],
}

impl Tint {
    pub fn solid(base: [f32; 4]) -> Self {
        Self {
            base,
            emission: [0.0; 3],
        }
    }

    pub fn with_emission(mut self, emission: [f32; 3]) -> Self {
        self.emission = emission;
        self
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::solid([0.8, 0.8, 0.8, 1.0])
    }
}

/// Marker: entity is not drawn this frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hidden;
