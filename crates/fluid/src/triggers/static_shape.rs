//! Single-shape trigger (props, boats, thrown objects).

use glam::Vec3;

use crate::constants::DEFAULT_STATIC_OFFSET_TOLERANCE;
use crate::registry::ForceRegistry;

use super::{BodyInfo, ForcePoint};

/// Emits one force point per tick while its shape is in the current water
/// body and has moved more than `offset_tolerance` since the last report.
#[derive(Clone, Debug)]
pub struct StaticTrigger {
    offset_tolerance: f32,
    /// Bounding-sphere radius of the trigger shape.
    radius: f32,
    in_water: bool,
    pre_location: Vec3,
}

impl StaticTrigger {
    pub fn new(radius: f32) -> Self {
        Self::with_tolerance(radius, DEFAULT_STATIC_OFFSET_TOLERANCE)
    }

    pub fn with_tolerance(radius: f32, offset_tolerance: f32) -> Self {
        assert!(radius > 0.0, "trigger radius must be positive, got {}", radius);
        Self {
            offset_tolerance,
            radius,
            in_water: false,
            pre_location: Vec3::ZERO,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn in_water(&self) -> bool {
        self.in_water
    }

    /// Start tracking at `location`. `overlapping` lists bodies the shape
    /// already touches; the first water body is reported when no current
    /// water has been chosen yet.
    pub fn begin_play(&mut self, location: Vec3, overlapping: &[BodyInfo], registry: &mut ForceRegistry) {
        self.pre_location = location;

        for body in overlapping {
            if registry.current_water().is_none() && registry.is_water(body) {
                registry.update_interactive_point(body, ForcePoint::new(body.location, self.radius));
            }
            if registry.current_water() == Some(body.id) {
                self.in_water = true;
            }
        }
    }

    /// The shape started overlapping `body` while at `location`.
    pub fn on_begin_overlap(&mut self, location: Vec3, body: &BodyInfo, registry: &mut ForceRegistry) {
        registry.update_interactive_point(body, ForcePoint::new(location, self.radius));
        if registry.current_water() == Some(body.id) {
            self.in_water = true;
        }
    }

    pub fn on_end_overlap(&mut self, body: &BodyInfo, registry: &ForceRegistry) {
        if registry.current_water() == Some(body.id) {
            self.in_water = false;
        }
    }

    /// The shape was blocked by `body` (a hit rather than an overlap).
    pub fn on_hit(&mut self, location: Vec3, body: &BodyInfo, registry: &mut ForceRegistry) {
        registry.update_interactive_point(body, ForcePoint::new(location, self.radius));
    }

    /// Returns the emitted point, if any.
    pub fn tick(&mut self, location: Vec3, registry: &mut ForceRegistry) -> Option<ForcePoint> {
        if !self.in_water || !registry.should_simulate_water() {
            return None;
        }
        if location.distance(self.pre_location) <= self.offset_tolerance {
            return None;
        }

        let point = ForcePoint::new(location, self.radius);
        registry.add_force_points([point]);
        self.pre_location = location;
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SimulationArea;
    use crate::triggers::{BodyId, MaterialId};
    use glam::Vec2;

    fn setup() -> (ForceRegistry, BodyInfo) {
        let mut registry = ForceRegistry::new(Some(MaterialId(1)));
        registry.set_simulation_area(Some(SimulationArea {
            center: Vec3::ZERO,
            role_uv: Vec2::splat(0.5),
            area_size: 1000.0,
        }));
        registry.set_simulating(true);
        (registry, BodyInfo::new(BodyId(9), Some(MaterialId(1)), Vec3::ZERO))
    }

    #[test]
    fn test_emits_only_after_moving_past_tolerance() {
        let (mut registry, pond) = setup();
        let mut trigger = StaticTrigger::new(25.0);
        trigger.begin_play(Vec3::ZERO, &[], &mut registry);
        trigger.on_begin_overlap(Vec3::ZERO, &pond, &mut registry);
        assert!(trigger.in_water());
        registry.clear_force_points();

        assert!(trigger.tick(Vec3::new(0.5, 0.0, 0.0), &mut registry).is_none());
        let point = trigger.tick(Vec3::new(3.0, 0.0, 0.0), &mut registry);
        assert_eq!(point, Some(ForcePoint::new(Vec3::new(3.0, 0.0, 0.0), 25.0)));
        assert!(trigger.tick(Vec3::new(3.5, 0.0, 0.0), &mut registry).is_none());
    }

    #[test]
    fn test_end_overlap_stops_emission() {
        let (mut registry, pond) = setup();
        let mut trigger = StaticTrigger::new(10.0);
        trigger.begin_play(Vec3::ZERO, &[pond], &mut registry);
        assert!(trigger.in_water(), "initial overlap scan adopts the pond");

        trigger.on_end_overlap(&pond, &registry);
        assert!(trigger.tick(Vec3::splat(50.0), &mut registry).is_none());
    }

    #[test]
    fn test_hit_reports_contact_point() {
        let (mut registry, pond) = setup();
        let mut trigger = StaticTrigger::new(12.0);
        trigger.begin_play(Vec3::ZERO, &[], &mut registry);

        trigger.on_hit(Vec3::new(5.0, 5.0, 0.0), &pond, &mut registry);
        assert_eq!(registry.force_points(), &[ForcePoint::new(Vec3::new(5.0, 5.0, 0.0), 12.0)]);
        assert_eq!(registry.current_water(), Some(pond.id));
        assert!(!trigger.in_water(), "a hit does not count as being submerged");
    }
}
