//! Force-point producers.
//!
//! Triggers watch for a moving body intersecting the registered water body
//! and push disturbance points into the [`ForceRegistry`]. Overlap
//! detection itself belongs to the host (physics engine, scene graph); the
//! triggers only react to begin/end events and per-tick locations.
//!
//! [`ForceRegistry`]: crate::registry::ForceRegistry

mod skeletal;
mod static_shape;

pub use skeletal::{SkeletalTrigger, TriggerBoneInfo};
pub use static_shape::StaticTrigger;

use glam::Vec3;

/// A world-space disturbance consumed once by the next water update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForcePoint {
    pub position: Vec3,
    pub radius: f32,
}

impl ForcePoint {
    pub const fn new(position: Vec3, radius: f32) -> Self {
        Self { position, radius }
    }
}

/// Host-assigned identity of a physics body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

/// Host-assigned identity of a surface/physical material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

/// What a trigger learns about a body it overlaps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyInfo {
    pub id: BodyId,
    pub material: Option<MaterialId>,
    /// Body origin in world space.
    pub location: Vec3,
}

impl BodyInfo {
    pub fn new(id: BodyId, material: Option<MaterialId>, location: Vec3) -> Self {
        Self { id, material, location }
    }
}
