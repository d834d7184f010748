//! Height-field passes: apply force, propagate waves, derive normals.
//!
//! Each pass reads the front height buffer and writes the back one over the
//! viewport interior `[1, W-1) x [1, H-1)`; the one-texel border keeps its
//! previous contents. Both height passes flip the switcher, so a cycle that
//! applies force advances it twice and the update pass reads what the force
//! pass just wrote.

use std::f32::consts::PI;

use glam::{IVec2, UVec2, Vec2, Vec3};

use crate::dispatch::Dispatcher;
use crate::grid::Grid2;
use crate::pingpong::PingPong;

use super::state::{ForcePointParam, HeightTexel, WaterFrame};

/// Owns the height buffers and normal map for one interactive field.
#[derive(Debug)]
pub struct HeightFieldSolver {
    heights: PingPong<Grid2<HeightTexel>>,
    normal_map: Grid2<Vec3>,
    dispatcher: Dispatcher,
    cycles: u64,
}

impl HeightFieldSolver {
    pub fn new(field_size: UVec2) -> Self {
        assert!(
            field_size.x >= 3 && field_size.y >= 3,
            "field_size must be at least 3x3, got {}x{}",
            field_size.x,
            field_size.y
        );
        let (w, h) = (field_size.x as usize, field_size.y as usize);
        Self {
            heights: PingPong::from_prototype(Grid2::new(w, h)),
            normal_map: Grid2::filled(w, h, Vec3::Z),
            dispatcher: Dispatcher::new(),
            cycles: 0,
        }
    }

    pub fn field_size(&self) -> UVec2 {
        self.heights.front().size()
    }

    #[inline]
    fn delta_uv(&self) -> Vec2 {
        Vec2::ONE / self.field_size().as_vec2()
    }

    /// Run one full update cycle.
    ///
    /// The frame's scroll offset is consumed by the first sampling pass:
    /// `apply_force` when it runs, otherwise `update_height_field`.
    pub fn update_water(&mut self, frame: &WaterFrame) {
        self.dispatcher.begin_frame();

        let mut scroll = frame.offset;
        if !frame.force_points.is_empty() || frame.move_dir != Vec2::ZERO {
            self.apply_force(&frame.force_points, scroll);
            scroll = Vec2::ZERO;
        }
        self.update_height_field(frame.attenuation, frame.time_weight, scroll);
        self.compute_normal();

        self.cycles += 1;
        log::debug!(
            "water cycle {}: {} force points, switcher={}",
            self.cycles,
            frame.force_points.len(),
            self.heights.index()
        );
    }

    /// Inject a cosine bump per force point into the scrolled previous field.
    pub fn apply_force(&mut self, points: &[ForcePointParam], scroll: Vec2) {
        let size = self.field_size();
        let (src, dst) = self.heights.split();

        self.dispatcher.dispatch_2d_region(
            "apply_force",
            dst,
            UVec2::ONE,
            size - UVec2::ONE,
            |id| {
                let uv = src.texel_uv(id.x, id.y);
                let mut texel = src.sample_uv_border(uv + scroll);
                for point in points {
                    let d = uv.distance(point.uv());
                    if d < point.radius {
                        texel.height += point.strength * 0.5 * (1.0 + (PI * d / point.radius).cos());
                    }
                }
                texel
            },
        );
        self.heights.swap();
    }

    /// Wave propagation with a blended time step.
    ///
    /// `time_weight` blends between the current height (0) and a full wave
    /// step (1) and is clamped to `[0, 1]`.
    pub fn update_height_field(&mut self, attenuation: f32, time_weight: f32, scroll: Vec2) {
        let size = self.field_size();
        let delta = self.delta_uv();
        let k = time_weight.clamp(0.0, 1.0);
        let (src, dst) = self.heights.split();

        self.dispatcher.dispatch_2d_region(
            "update_height_field",
            dst,
            UVec2::ONE,
            size - UVec2::ONE,
            |id| {
                let uv = src.texel_uv(id.x, id.y) + scroll;
                let c = src.sample_uv_border(uv);
                let l = src.sample_uv_border(uv - Vec2::new(delta.x, 0.0)).height;
                let r = src.sample_uv_border(uv + Vec2::new(delta.x, 0.0)).height;
                let d = src.sample_uv_border(uv - Vec2::new(0.0, delta.y)).height;
                let u = src.sample_uv_border(uv + Vec2::new(0.0, delta.y)).height;

                let propagated = 0.5 * (l + r + d + u) - c.previous;
                let height = (c.height + (propagated - c.height) * k) * attenuation;
                HeightTexel::new(height, c.height)
            },
        );
        self.heights.swap();
    }

    /// Central-difference normals of the latest heights.
    pub fn compute_normal(&mut self) {
        let size = self.field_size();
        let src = self.heights.front();

        self.dispatcher.dispatch_2d_region(
            "compute_normal",
            &mut self.normal_map,
            UVec2::ONE,
            size - UVec2::ONE,
            |id| {
                let p = id.as_ivec2();
                let hl = src.fetch_clamped(p - IVec2::X).height;
                let hr = src.fetch_clamped(p + IVec2::X).height;
                let hd = src.fetch_clamped(p - IVec2::Y).height;
                let hu = src.fetch_clamped(p + IVec2::Y).height;
                Vec3::new(hl - hr, hd - hu, 2.0).normalize()
            },
        );
    }

    /// Physical index of the buffer the next pass writes.
    pub fn switcher(&self) -> usize {
        self.heights.index()
    }

    /// Buffer the next pass writes.
    pub fn current_target(&self) -> &Grid2<HeightTexel> {
        self.heights.back()
    }

    /// Most recently written heights.
    pub fn latest_height(&self) -> &Grid2<HeightTexel> {
        self.heights.front()
    }

    pub fn normal_map(&self) -> &Grid2<Vec3> {
        &self.normal_map
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Completed update cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Latest heights as raw RG32F bytes.
    pub fn height_bytes(&self) -> &[u8] {
        self.heights.front().as_bytes()
    }

    /// Largest absolute height in the latest buffer.
    pub fn max_abs_height(&self) -> f32 {
        self.heights
            .front()
            .data()
            .iter()
            .map(|t| t.height.abs())
            .fold(0.0, f32::max)
    }
}
