//! Per-bone trigger for animated characters.
//!
//! One sphere follows each configured bone. Bones that are inside the
//! current water body and moved more than their tolerance since the last
//! tick report a point extrapolated one tick ahead, `cur + (cur - pre)`,
//! which hides a frame of update latency.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::registry::ForceRegistry;

use super::{BodyInfo, ForcePoint};

/// Static configuration of one tracked bone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerBoneInfo {
    pub bone_name: String,
    pub influence_radius: f32,
    pub offset_tolerance: f32,
}

impl TriggerBoneInfo {
    pub fn new(bone_name: impl Into<String>, influence_radius: f32, offset_tolerance: f32) -> Self {
        Self {
            bone_name: bone_name.into(),
            influence_radius,
            offset_tolerance,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SkeletalTrigger {
    bones: Vec<TriggerBoneInfo>,
    /// Indices of bones currently inside the water, in entry order.
    overlapping: Vec<usize>,
    pre_locations: Vec<Vec3>,
}

impl SkeletalTrigger {
    pub fn new(bones: Vec<TriggerBoneInfo>) -> Self {
        let pre_locations = vec![Vec3::ZERO; bones.len()];
        Self {
            bones,
            overlapping: Vec::new(),
            pre_locations,
        }
    }

    pub fn bones(&self) -> &[TriggerBoneInfo] {
        &self.bones
    }

    /// Index of the bone called `name`.
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.bone_name == name)
    }

    pub fn overlapping_bones(&self) -> &[usize] {
        &self.overlapping
    }

    fn mark_overlapping(&mut self, index: usize, location: Vec3) {
        if !self.overlapping.contains(&index) {
            self.overlapping.push(index);
            self.pre_locations[index] = location;
        }
    }

    /// Initial scan. `overlaps` pairs a bone index with a body that bone's
    /// sphere already touches.
    pub fn begin_play(
        &mut self,
        bone_locations: &[Vec3],
        overlaps: &[(usize, BodyInfo)],
        registry: &mut ForceRegistry,
    ) {
        if bone_locations.len() != self.bones.len() {
            log::error!(
                "Bone location count mismatch in begin_play: {} vs {}",
                bone_locations.len(),
                self.bones.len()
            );
            return;
        }
        self.pre_locations.copy_from_slice(bone_locations);

        for (index, body) in overlaps {
            let Some(bone) = self.bones.get(*index) else {
                log::warn!("overlap reported for unknown bone {}", index);
                continue;
            };
            if registry.current_water().is_none() && registry.is_water(body) {
                let point = ForcePoint::new(body.location, bone.influence_radius);
                registry.update_interactive_point(body, point);
            }
            if registry.current_water() == Some(body.id) {
                self.mark_overlapping(*index, bone_locations[*index]);
            }
        }
    }

    /// Bone `index` entered `body`. The owner location seeds the first
    /// point, as the bone itself may still be above the surface.
    pub fn on_bone_begin_overlap(
        &mut self,
        index: usize,
        owner_location: Vec3,
        bone_location: Vec3,
        body: &BodyInfo,
        registry: &mut ForceRegistry,
    ) {
        let Some(bone) = self.bones.get(index) else {
            return;
        };
        if !registry.is_water(body) {
            return;
        }
        let point = ForcePoint::new(owner_location, bone.influence_radius);
        registry.update_interactive_point(body, point);

        if registry.current_water() == Some(body.id) {
            self.mark_overlapping(index, bone_location);
        }
    }

    pub fn on_bone_end_overlap(&mut self, index: usize, body: &BodyInfo, registry: &ForceRegistry) {
        if registry.current_water() == Some(body.id) {
            self.overlapping.retain(|&i| i != index);
        }
    }

    /// Emit points for moving submerged bones, then remember every bone's
    /// location for the next tick.
    pub fn tick(&mut self, bone_locations: &[Vec3], registry: &mut ForceRegistry) -> Vec<ForcePoint> {
        if bone_locations.len() != self.bones.len() {
            log::error!(
                "Bone location count mismatch in tick: {} vs {}",
                bone_locations.len(),
                self.bones.len()
            );
            return Vec::new();
        }

        let points: Vec<ForcePoint> = self
            .overlapping
            .iter()
            .filter_map(|&index| {
                let bone = &self.bones[index];
                let cur = bone_locations[index];
                let moved = cur - self.pre_locations[index];
                (moved.length() > bone.offset_tolerance)
                    .then(|| ForcePoint::new(cur + moved, bone.influence_radius))
            })
            .collect();

        registry.add_force_points(points.iter().copied());
        self.pre_locations.copy_from_slice(bone_locations);
        points
    }
}
