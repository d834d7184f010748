//! Per-owner water driver.
//!
//! Runs on the gameplay side once per tick: gates updates on the fixed
//! period, pauses an idle field, converts the owner's movement into a UV
//! scroll, consumes the registry's force points and hands back the frame the
//! solver should run plus the parameters the water surface material needs.

use glam::{Vec2, Vec3};

use crate::config::WaterConfig;
use crate::constants::{MIN_MOVE_UV, NEARLY_ZERO};
use crate::registry::{ForceRegistry, SimulationArea};
use crate::triggers::{BodyId, BodyInfo};

use super::state::{InteractiveWater, WaterFrame};

/// Values the water surface material samples the field with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaterMaterialParams {
    pub wave_size: f32,
    pub role_location: Vec3,
    pub role_uv: Vec2,
}

/// Result of a tick that runs an update.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterTick {
    pub frame: WaterFrame,
    /// `None` until a water body has been found.
    pub material: Option<WaterMaterialParams>,
}

#[derive(Debug)]
pub struct WaterDriver {
    config: WaterConfig,
    water: InteractiveWater,
    pre_location: Vec3,
    stop_time_accumulator: f32,
    current_water: Option<BodyId>,
}

impl WaterDriver {
    pub fn new(config: WaterConfig) -> Self {
        let mut water = InteractiveWater::with_rate(config.iterations_per_second);
        water.set_force_strength(config.force_strength);
        Self {
            config,
            water,
            pre_location: Vec3::ZERO,
            stop_time_accumulator: 0.0,
            current_water: None,
        }
    }

    pub fn config(&self) -> &WaterConfig {
        &self.config
    }

    pub fn water(&self) -> &InteractiveWater {
        &self.water
    }

    pub fn current_water(&self) -> Option<BodyId> {
        self.current_water
    }

    fn area(&self, center: Vec3) -> SimulationArea {
        SimulationArea {
            center,
            role_uv: self.water.role_uv(),
            area_size: self.config.interactive_area_size,
        }
    }

    /// Publish the field to the registry and pick up any water the owner
    /// already stands in.
    pub fn begin_play(&mut self, owner: Vec3, overlapping: &[BodyInfo], registry: &mut ForceRegistry) {
        self.pre_location = owner;
        registry.set_simulation_area(Some(self.area(owner)));

        if let Some(body) = overlapping.iter().find(|b| registry.is_water(b)) {
            if self.current_water.is_none() {
                self.current_water = Some(body.id);
                registry.set_current_water(Some(body.id));
            }
        }
        log::info!(
            "water driver started: field {:?}, area {}",
            self.config.field_size,
            self.config.interactive_area_size
        );
    }

    /// The owner entered `body`. Water bodies become current and locked.
    pub fn on_begin_overlap(&mut self, body: &BodyInfo, registry: &mut ForceRegistry) {
        if registry.water_material().is_none() {
            log::warn!("water material is not set, ignoring overlap with {:?}", body.id);
            return;
        }
        if registry.is_water(body) {
            self.current_water = Some(body.id);
            registry.set_can_change_water(false);
            registry.set_current_water(Some(body.id));
        }
    }

    /// The owner left `body`; the current water may change again.
    pub fn on_end_overlap(&mut self, body: &BodyInfo, registry: &mut ForceRegistry) {
        if self.current_water == Some(body.id) {
            registry.set_can_change_water(true);
        }
    }

    /// Owner movement since the last update as a field UV direction.
    fn move_dir(&self, owner: Vec3) -> Vec2 {
        let delta = owner - self.pre_location;
        let mut delta_uv = Vec2::new(delta.x, delta.y) / self.config.interactive_area_size;
        if delta_uv.length() <= NEARLY_ZERO && delta.length() > 0.0 {
            delta_uv = Vec2::splat(MIN_MOVE_UV);
        }
        Vec2::new(delta_uv.y, -delta_uv.x)
    }

    /// Advance one tick. Returns the frame to submit when the field updates.
    pub fn tick(&mut self, dt: f32, owner: Vec3, registry: &mut ForceRegistry) -> Option<WaterTick> {
        let should_update = self.water.update_time_accumulator(dt);
        registry.set_simulating(should_update);
        registry.set_simulation_area(Some(self.area(owner)));
        if !should_update {
            return None;
        }

        if registry.has_force_points() {
            self.stop_time_accumulator = 0.0;
        } else {
            self.stop_time_accumulator += dt;
        }
        if self.stop_time_accumulator > self.config.stop_simulation_threshold
            && dt <= self.water.per_simulate_duration()
        {
            log::trace!("water idle for {:.2}s, skipping update", self.stop_time_accumulator);
            return None;
        }

        let cur_dir = self.move_dir(owner);
        let forces = registry.take_force_points();
        self.water.update_force_params(
            dt,
            cur_dir,
            owner,
            self.config.interactive_area_size,
            &forces,
        );
        self.pre_location = owner;
        registry.set_simulation_area(Some(self.area(owner)));

        if self.current_water.is_none() {
            self.current_water = registry.current_water();
        }
        let material = self.current_water.map(|_| WaterMaterialParams {
            wave_size: self.config.interactive_area_size,
            role_location: owner,
            role_uv: self.water.role_uv(),
        });

        Some(WaterTick {
            frame: self.water.frame(),
            material,
        })
    }
}
