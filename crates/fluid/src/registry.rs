//! Gameplay-side registry connecting triggers to the water driver.
//!
//! Triggers push [`ForcePoint`]s here during their tick; the water driver
//! takes the whole batch once per update cycle. Points are never carried
//! over: whatever is not taken is discarded by the next `take_force_points`
//! or `clear_force_points`.
//!
//! The registry also remembers which body is the current water surface and
//! where the simulated area sits, so triggers can reject points the field
//! would never see.

use glam::{Vec2, Vec3};

use crate::triggers::{BodyId, BodyInfo, ForcePoint, MaterialId};
use crate::water::world_delta_to_uv;

/// Where the height field currently sits in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationArea {
    /// World location of the role the field follows.
    pub center: Vec3,
    /// Role position inside the field.
    pub role_uv: Vec2,
    /// World-space footprint of the field.
    pub area_size: f32,
}

impl SimulationArea {
    pub fn world_to_uv(&self, pos: Vec3) -> Vec2 {
        self.role_uv + world_delta_to_uv(pos - self.center, self.area_size)
    }

    pub fn contains(&self, pos: Vec3) -> bool {
        let uv = self.world_to_uv(pos);
        uv.x >= 0.0 && uv.x <= 1.0 && uv.y >= 0.0 && uv.y <= 1.0
    }
}

#[derive(Debug)]
pub struct ForceRegistry {
    water_material: Option<MaterialId>,
    current_water: Option<BodyId>,
    can_change_water: bool,
    simulating: bool,
    area: Option<SimulationArea>,
    points: Vec<ForcePoint>,
}

impl Default for ForceRegistry {
    fn default() -> Self {
        Self {
            water_material: None,
            current_water: None,
            can_change_water: true,
            simulating: false,
            area: None,
            points: Vec::new(),
        }
    }
}

impl ForceRegistry {
    pub fn new(water_material: Option<MaterialId>) -> Self {
        Self {
            water_material,
            ..Self::default()
        }
    }

    pub fn water_material(&self) -> Option<MaterialId> {
        self.water_material
    }

    pub fn set_water_material(&mut self, material: Option<MaterialId>) {
        self.water_material = material;
    }

    /// True when `body` carries the water material.
    pub fn is_water(&self, body: &BodyInfo) -> bool {
        match (self.water_material, body.material) {
            (Some(water), Some(material)) => water == material,
            _ => false,
        }
    }

    pub fn current_water(&self) -> Option<BodyId> {
        self.current_water
    }

    pub fn set_current_water(&mut self, body: Option<BodyId>) {
        if self.current_water != body {
            log::info!("current water body: {:?} -> {:?}", self.current_water, body);
        }
        self.current_water = body;
    }

    pub fn can_change_water(&self) -> bool {
        self.can_change_water
    }

    /// Lock (`false`) or unlock (`true`) the current water body.
    pub fn set_can_change_water(&mut self, can_change: bool) {
        self.can_change_water = can_change;
    }

    /// Set by the water driver each tick.
    pub fn set_simulating(&mut self, simulating: bool) {
        self.simulating = simulating;
    }

    /// Whether the driver runs an update this tick. False with no driver.
    pub fn should_simulate_water(&self) -> bool {
        self.area.is_some() && self.simulating
    }

    pub fn set_simulation_area(&mut self, area: Option<SimulationArea>) {
        self.area = area;
    }

    pub fn simulation_area(&self) -> Option<SimulationArea> {
        self.area
    }

    /// World offset to field UV, if a driver has published its area.
    pub fn convert_world_to_uv(&self, delta: Vec3) -> Option<Vec2> {
        self.area.map(|a| world_delta_to_uv(delta, a.area_size))
    }

    /// Whether `pos` lands inside the simulated field.
    pub fn check_pos_in_simulate_area(&self, pos: Vec3) -> bool {
        self.area.is_some_and(|a| a.contains(pos))
    }

    /// Validate a contact with `body` and record `point` if it is usable.
    ///
    /// Rejects bodies without the water material, a different body while the
    /// current one is locked, and points outside the simulated field. The
    /// first accepted body becomes the current water; an unlocked current
    /// water is replaced by the body that produced the point.
    pub fn update_interactive_point(&mut self, body: &BodyInfo, point: ForcePoint) -> bool {
        if self.area.is_none() {
            log::trace!("no water driver, ignoring contact with {:?}", body.id);
            return false;
        }
        if !self.is_water(body) {
            return false;
        }
        if let Some(current) = self.current_water {
            if current != body.id && !self.can_change_water {
                return false;
            }
        }
        if !self.check_pos_in_simulate_area(point.position) {
            return false;
        }

        self.points.push(point);
        if self.current_water != Some(body.id) {
            self.set_current_water(Some(body.id));
        }
        true
    }

    pub fn add_force_points<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = ForcePoint>,
    {
        self.points.extend(points);
    }

    pub fn force_points(&self) -> &[ForcePoint] {
        &self.points
    }

    pub fn has_force_points(&self) -> bool {
        !self.points.is_empty()
    }

    /// Take every pending point, leaving the registry empty.
    pub fn take_force_points(&mut self) -> Vec<ForcePoint> {
        std::mem::take(&mut self.points)
    }

    pub fn clear_force_points(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATER: MaterialId = MaterialId(7);

    fn registry_with_area() -> ForceRegistry {
        let mut registry = ForceRegistry::new(Some(WATER));
        registry.set_simulation_area(Some(SimulationArea {
            center: Vec3::ZERO,
            role_uv: Vec2::splat(0.5),
            area_size: 1000.0,
        }));
        registry
    }

    fn pond(id: u64) -> BodyInfo {
        BodyInfo::new(BodyId(id), Some(WATER), Vec3::ZERO)
    }

    #[test]
    fn test_rejects_non_water_body() {
        let mut registry = registry_with_area();
        let rock = BodyInfo::new(BodyId(3), Some(MaterialId(1)), Vec3::ZERO);
        assert!(!registry.update_interactive_point(&rock, ForcePoint::new(Vec3::ZERO, 10.0)));
        assert!(!registry.has_force_points());
    }

    #[test]
    fn test_first_water_body_is_adopted() {
        let mut registry = registry_with_area();
        assert!(registry.update_interactive_point(&pond(1), ForcePoint::new(Vec3::ZERO, 10.0)));
        assert_eq!(registry.current_water(), Some(BodyId(1)));
        assert_eq!(registry.force_points().len(), 1);
    }

    #[test]
    fn test_locked_water_rejects_other_body() {
        let mut registry = registry_with_area();
        registry.set_current_water(Some(BodyId(1)));
        registry.set_can_change_water(false);

        assert!(!registry.update_interactive_point(&pond(2), ForcePoint::new(Vec3::ZERO, 10.0)));
        assert!(registry.update_interactive_point(&pond(1), ForcePoint::new(Vec3::ZERO, 10.0)));
    }

    #[test]
    fn test_outside_area_is_rejected() {
        let mut registry = registry_with_area();
        let far = ForcePoint::new(Vec3::new(0.0, 900.0, 0.0), 10.0);
        assert!(!registry.update_interactive_point(&pond(1), far));
        assert_eq!(registry.current_water(), None);
    }

    #[test]
    fn test_take_clears_points() {
        let mut registry = ForceRegistry::default();
        registry.add_force_points([ForcePoint::new(Vec3::X, 1.0), ForcePoint::new(Vec3::Y, 1.0)]);
        assert_eq!(registry.take_force_points().len(), 2);
        assert!(registry.take_force_points().is_empty());
    }

    #[test]
    fn test_should_simulate_requires_driver() {
        let mut registry = ForceRegistry::default();
        registry.set_simulating(true);
        assert!(!registry.should_simulate_water());
        registry.set_simulation_area(Some(SimulationArea {
            center: Vec3::ZERO,
            role_uv: Vec2::splat(0.5),
            area_size: 100.0,
        }));
        assert!(registry.should_simulate_water());
    }

    #[test]
    fn test_uv_conversion_needs_area() {
        let mut registry = ForceRegistry::default();
        assert_eq!(registry.convert_world_to_uv(Vec3::X), None);

        registry.set_water_material(Some(WATER));
        assert!(registry.is_water(&pond(1)));

        let registry = registry_with_area();
        let uv = registry.convert_world_to_uv(Vec3::new(100.0, 50.0, 0.0));
        assert_eq!(uv, Some(Vec2::new(0.05, -0.1)));
    }
}
