//! Per-volume parameters and persistent solver state.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_IMPULSE_COLOR, DEFAULT_IMPULSE_FORCE, DEFAULT_IMPULSE_HEIGHT, DEFAULT_IMPULSE_RADIUS,
    DEFAULT_JACOBI_ITERATIONS, DEFAULT_VOLUME_SIZE, DEFAULT_VORTICITY_SCALE, HALF_RDX,
};
use crate::dispatch::Dispatcher;
use crate::grid::Grid3;
use crate::pingpong::PingPong;
use crate::serde_utils::{
    deserialize_opt_uvec3, deserialize_uvec3, deserialize_vec3, serialize_opt_uvec3,
    serialize_uvec3, serialize_vec3,
};

use super::passes;

/// Jacobi sweeps actually run for a requested count (rounded down to even).
#[inline]
pub fn effective_iterations(iteration_count: u32) -> u32 {
    iteration_count & !1
}

/// Where and how strongly the volume is fed each step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpulseConfig {
    /// Voxel position; `None` means `(X/2, 20, Z/2)`.
    #[serde(
        serialize_with = "serialize_opt_uvec3",
        deserialize_with = "deserialize_opt_uvec3"
    )]
    pub position: Option<UVec3>,
    pub radius: f32,
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub force: Vec3,
    #[serde(serialize_with = "serialize_vec3", deserialize_with = "deserialize_vec3")]
    pub color: Vec3,
}

impl Default for ImpulseConfig {
    fn default() -> Self {
        Self {
            position: None,
            radius: DEFAULT_IMPULSE_RADIUS,
            force: Vec3::from(DEFAULT_IMPULSE_FORCE),
            color: Vec3::from(DEFAULT_IMPULSE_COLOR),
        }
    }
}

impl ImpulseConfig {
    /// Voxel position for a volume of `size`.
    pub fn resolve_position(&self, size: UVec3) -> UVec3 {
        self.position
            .unwrap_or_else(|| UVec3::new(size.x / 2, DEFAULT_IMPULSE_HEIGHT, size.z / 2))
    }
}

/// Parameters the owner of a volume publishes each frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeFluidParams {
    #[serde(serialize_with = "serialize_uvec3", deserialize_with = "deserialize_uvec3")]
    pub size: UVec3,
    pub time_step: f32,
    pub vorticity_scale: f32,
    pub iteration_count: u32,
    pub impulse: ImpulseConfig,
}

impl Default for VolumeFluidParams {
    fn default() -> Self {
        Self {
            size: UVec3::splat(DEFAULT_VOLUME_SIZE),
            time_step: 1.0 / 60.0,
            vorticity_scale: DEFAULT_VORTICITY_SCALE,
            iteration_count: DEFAULT_JACOBI_ITERATIONS,
            impulse: ImpulseConfig::default(),
        }
    }
}

impl VolumeFluidParams {
    pub fn with_size(size: UVec3) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.size.min_element() == 0 {
            return Err(format!("size must be non-zero on every axis, got {:?}", self.size));
        }
        if self.time_step.is_nan() || self.time_step < 0.0 {
            return Err(format!("time_step must not be negative, got {}", self.time_step));
        }
        if self.impulse.radius < 0.0 {
            return Err(format!(
                "impulse.radius must not be negative, got {}",
                self.impulse.radius
            ));
        }
        Ok(())
    }
}

/// Buffers of one simulated volume. Allocated once and reused every step.
#[derive(Debug)]
pub struct VolumeFluidState {
    size: UVec3,
    velocity: PingPong<Grid3<Vec3>>,
    pressure: PingPong<Grid3<f32>>,
    color: PingPong<Grid3<Vec3>>,
    vorticity: Grid3<Vec3>,
    divergence: Grid3<f32>,
    dispatcher: Dispatcher,
    frame: u64,
}

impl VolumeFluidState {
    pub fn new(size: UVec3) -> Self {
        assert!(
            size.min_element() > 0,
            "volume size must be non-zero, got {:?}",
            size
        );
        Self {
            size,
            velocity: PingPong::from_prototype(Grid3::with_size(size)),
            pressure: PingPong::from_prototype(Grid3::with_size(size)),
            color: PingPong::from_prototype(Grid3::with_size(size)),
            vorticity: Grid3::with_size(size),
            divergence: Grid3::with_size(size),
            dispatcher: Dispatcher::new(),
            frame: 0,
        }
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    /// Run one frame of the pipeline.
    ///
    /// Velocity and color are both advected by the pre-advection velocity.
    pub fn step(&mut self, params: &VolumeFluidParams) {
        if params.size != self.size {
            log::error!(
                "Volume size mismatch in step: params {:?}, buffers {:?}",
                params.size,
                self.size
            );
            return;
        }

        let dt = params.time_step;
        let d = &mut self.dispatcher;
        d.begin_frame();

        // 1. Advect
        {
            let (vel, vel_dst) = self.velocity.split();
            passes::advect(d, "advect_velocity", dt, vel, vel, vel_dst);
            let (color, color_dst) = self.color.split();
            passes::advect(d, "advect_color", dt, self.velocity.front(), color, color_dst);
        }
        self.velocity.swap();
        self.color.swap();

        // 2. Vorticity confinement
        passes::vorticity(d, HALF_RDX, self.velocity.front(), &mut self.vorticity);
        {
            let (vel, vel_dst) = self.velocity.split();
            passes::vorticity_force(
                d,
                HALF_RDX,
                dt,
                params.vorticity_scale,
                &self.vorticity,
                vel,
                vel_dst,
            );
        }
        self.velocity.swap();

        // 3. External impulse
        let position = params.impulse.resolve_position(self.size);
        {
            let (vel, vel_dst) = self.velocity.split();
            passes::add_impulse(
                d,
                "impulse_velocity",
                position,
                params.impulse.radius,
                params.impulse.force,
                vel,
                vel_dst,
            );
        }
        self.velocity.swap();
        {
            let (color, color_dst) = self.color.split();
            passes::add_impulse(
                d,
                "impulse_color",
                position,
                params.impulse.radius,
                params.impulse.color,
                color,
                color_dst,
            );
        }
        self.color.swap();

        // 4. Projection
        passes::divergence(d, HALF_RDX, self.velocity.front(), &mut self.divergence);
        let iterations = effective_iterations(params.iteration_count);
        passes::jacobi(d, iterations, &self.divergence, &mut self.pressure);
        {
            let (vel, vel_dst) = self.velocity.split();
            passes::subtract_gradient(d, HALF_RDX, self.pressure.front(), vel, vel_dst);
        }
        self.velocity.swap();

        self.frame += 1;
        log::debug!(
            "volume {:?} frame {}: {} passes, {} jacobi sweeps",
            self.size,
            self.frame,
            d.passes().len(),
            iterations
        );
    }

    pub fn velocity(&self) -> &Grid3<Vec3> {
        self.velocity.front()
    }

    pub fn pressure(&self) -> &Grid3<f32> {
        self.pressure.front()
    }

    pub fn color(&self) -> &Grid3<Vec3> {
        self.color.front()
    }

    pub fn vorticity(&self) -> &Grid3<Vec3> {
        &self.vorticity
    }

    pub fn divergence(&self) -> &Grid3<f32> {
        &self.divergence
    }

    /// Physical write indices of the velocity, pressure and color buffers.
    pub fn buffer_indices(&self) -> [usize; 3] {
        [
            self.velocity.index(),
            self.pressure.index(),
            self.color.index(),
        ]
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Completed steps.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
