//! Gameplay-side state of the interactive water field.
//!
//! `InteractiveWater` owns everything computed before a height-field update
//! is submitted: the fixed-period accumulator, the scrolling role UV and the
//! force points converted into field UV space. `frame()` snapshots that state
//! into a `WaterFrame` the solver consumes on the simulation thread.

use std::ops::{Add, Mul};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::constants::{
    ACTIVE_ATTENUATION, DEFAULT_FORCE_STRENGTH, IDLE_ATTENUATION, ROLE_OFFSET_TOLERANCE,
};
use crate::triggers::ForcePoint;

/// One height-field texel: current height and the height one update earlier.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct HeightTexel {
    pub height: f32,
    pub previous: f32,
}

impl HeightTexel {
    pub const fn new(height: f32, previous: f32) -> Self {
        Self { height, previous }
    }
}

impl Add for HeightTexel {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.height + rhs.height, self.previous + rhs.previous)
    }
}

impl Mul<f32> for HeightTexel {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.height * rhs, self.previous * rhs)
    }
}

/// A force point already converted into field UV space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ForcePointParam {
    pub uv: [f32; 2],
    /// Radius in UV units.
    pub radius: f32,
    pub strength: f32,
}

impl ForcePointParam {
    pub fn uv(&self) -> Vec2 {
        Vec2::from(self.uv)
    }
}

/// Everything the solver needs for one update cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaterFrame {
    pub force_points: Vec<ForcePointParam>,
    /// UV scroll applied this cycle so the field follows the role.
    pub offset: Vec2,
    pub move_dir: Vec2,
    pub attenuation: f32,
    /// `delta_time / per_simulate_duration`.
    pub time_weight: f32,
}

/// Map a world-space offset from the field centre into UV space.
#[inline]
pub fn world_delta_to_uv(delta: Vec3, area_size: f32) -> Vec2 {
    Vec2::new(delta.y / area_size, -delta.x / area_size)
}

/// Inverse of [`world_delta_to_uv`] on the horizontal plane.
#[inline]
pub fn uv_to_world_delta(uv: Vec2, area_size: f32) -> Vec3 {
    Vec3::new(-uv.y * area_size, uv.x * area_size, 0.0)
}

#[inline]
fn in_unit_square(uv: Vec2) -> bool {
    uv.x >= 0.0 && uv.x <= 1.0 && uv.y >= 0.0 && uv.y <= 1.0
}

/// Per-owner water state computed on the gameplay side.
#[derive(Clone, Debug)]
pub struct InteractiveWater {
    per_simulate_duration: f32,
    time_accumulator: f32,
    should_update: bool,
    role_uv: Vec2,
    offset: Vec2,
    move_dir: Vec2,
    delta_time: f32,
    area_size: f32,
    force_strength: f32,
    force_params: Vec<ForcePointParam>,
}

impl InteractiveWater {
    pub fn new(per_simulate_duration: f32) -> Self {
        assert!(
            per_simulate_duration > 0.0,
            "per_simulate_duration must be positive, got {}",
            per_simulate_duration
        );
        Self {
            per_simulate_duration,
            time_accumulator: 0.0,
            should_update: true,
            role_uv: Vec2::splat(0.5),
            offset: Vec2::ZERO,
            move_dir: Vec2::ZERO,
            delta_time: 0.0,
            area_size: 0.0,
            force_strength: DEFAULT_FORCE_STRENGTH,
            force_params: Vec::new(),
        }
    }

    /// Build from an update rate instead of a period.
    pub fn with_rate(iterations_per_second: f32) -> Self {
        assert!(
            iterations_per_second > 0.0,
            "iterations_per_second must be positive, got {}",
            iterations_per_second
        );
        Self::new(1.0 / iterations_per_second)
    }

    pub fn set_force_strength(&mut self, strength: f32) {
        self.force_strength = strength;
    }

    pub fn per_simulate_duration(&self) -> f32 {
        self.per_simulate_duration
    }

    /// Advance the fixed-period accumulator. Returns whether this tick updates.
    pub fn update_time_accumulator(&mut self, dt: f32) -> bool {
        self.time_accumulator += dt;
        if self.time_accumulator >= self.per_simulate_duration {
            self.time_accumulator = 0.0;
            self.should_update = true;
        } else {
            self.should_update = false;
        }
        self.should_update
    }

    pub fn should_simulate(&self) -> bool {
        self.should_update
    }

    /// Coefficient the height update multiplies into every texel.
    pub fn attenuation(&self) -> f32 {
        if self.should_update {
            ACTIVE_ATTENUATION
        } else {
            IDLE_ATTENUATION
        }
    }

    /// Move the role by `cur_dir` and re-centre the field when the role
    /// leaves the tolerance band around `(0.5, 0.5)`.
    ///
    /// Returns the new role UV. The scroll for this cycle is kept in
    /// `offset()`.
    pub fn update_role_uv(&mut self, cur_dir: Vec2) -> Vec2 {
        self.role_uv += cur_dir;
        let mut offset = cur_dir * 0.5;

        let from_centre = self.role_uv - Vec2::splat(0.5);
        let excess_x = from_centre.x.abs() - ROLE_OFFSET_TOLERANCE;
        if excess_x > 0.0 {
            offset.x = if from_centre.x > 0.0 { excess_x } else { -excess_x };
        }
        let excess_y = from_centre.y.abs() - ROLE_OFFSET_TOLERANCE;
        if excess_y > 0.0 {
            offset.y = if from_centre.y > 0.0 { excess_y } else { -excess_y };
        }

        self.role_uv -= offset;
        self.role_uv = Vec2::new(self.role_uv.x.rem_euclid(1.0), self.role_uv.y.rem_euclid(1.0));
        self.offset = offset;
        self.role_uv
    }

    /// Rebuild the force parameters for this cycle.
    ///
    /// Points whose UV lands outside `[0, 1]^2` are dropped.
    pub fn update_force_params(
        &mut self,
        dt: f32,
        cur_dir: Vec2,
        center: Vec3,
        area_size: f32,
        forces: &[ForcePoint],
    ) {
        assert!(area_size > 0.0, "area_size must be positive, got {}", area_size);

        self.area_size = area_size;
        self.delta_time = dt;
        self.move_dir = cur_dir;
        self.force_params.clear();

        let role_uv = self.update_role_uv(cur_dir);
        for force in forces {
            let uv = role_uv + world_delta_to_uv(force.position - center, area_size);
            if in_unit_square(uv) {
                self.force_params.push(ForcePointParam {
                    uv: uv.to_array(),
                    radius: force.radius / area_size,
                    strength: self.force_strength,
                });
            }
        }

        log::debug!(
            "water force params: {} of {} points in field, role_uv={:?}",
            self.force_params.len(),
            forces.len(),
            role_uv
        );
    }

    /// Role position in field UV space.
    pub fn role_uv(&self) -> Vec2 {
        self.role_uv
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn move_dir(&self) -> Vec2 {
        self.move_dir
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn area_size(&self) -> f32 {
        self.area_size
    }

    pub fn force_params(&self) -> &[ForcePointParam] {
        &self.force_params
    }

    /// Whether `pos` (world) falls inside the field when the role is at `center`.
    pub fn contains(&self, pos: Vec3, center: Vec3, area_size: f32) -> bool {
        in_unit_square(self.role_uv + world_delta_to_uv(pos - center, area_size))
    }

    /// Snapshot for the solver.
    pub fn frame(&self) -> WaterFrame {
        WaterFrame {
            force_points: self.force_params.clone(),
            offset: self.offset,
            move_dir: self.move_dir,
            attenuation: self.attenuation(),
            time_weight: self.delta_time / self.per_simulate_duration,
        }
    }
}
