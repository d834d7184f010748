//! Interactive water and volume fluid simulation.
//!
//! Two solvers share one dispatch model (`8`-wide thread groups over dense
//! grids, double-buffered with [`PingPong`]):
//!
//! - [`water`]: a scrolling 2D height field disturbed by moving force points.
//! - [`volume`]: a 3D stable-fluids smoke solver with vorticity confinement
//!   and a Jacobi pressure projection.
//!
//! Gameplay code collects force points with [`triggers`] into a
//! [`ForceRegistry`], drives the field with a [`WaterDriver`] and submits the
//! resulting frames to a [`SimThread`], which owns every solver buffer.
//!
//! # Example
//!
//! ```
//! use fluid::{SimConfig, SimThread, SimWorld, WaterDriver, ForceRegistry};
//! use glam::{UVec2, Vec3};
//!
//! let config = SimConfig::default();
//! let sim = SimThread::spawn(SimWorld::new()).unwrap();
//! sim.enqueue(|world| world.set_water_resource(UVec2::splat(64)));
//!
//! let mut registry = ForceRegistry::default();
//! let mut driver = WaterDriver::new(config.water.clone());
//! driver.begin_play(Vec3::ZERO, &[], &mut registry);
//!
//! for frame in 0..4 {
//!     let owner = Vec3::new(frame as f32 * 10.0, 0.0, 0.0);
//!     if let Some(tick) = driver.tick(1.0 / 30.0, owner, &mut registry) {
//!         sim.submit_water(tick.frame);
//!     }
//! }
//! assert!(sim.flush());
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod grid;
pub mod pingpong;
pub mod registry;
pub mod serde_utils;
pub mod sim_thread;
pub mod triggers;
pub mod volume;
pub mod water;

pub use config::{SimConfig, TriggerConfig, WaterConfig};
pub use dispatch::{group_count_2d, group_count_3d, DispatchStats, Dispatcher, PassRecord};
pub use glam::{UVec2, UVec3, Vec2, Vec3};
pub use grid::{Grid2, Grid3};
pub use pingpong::PingPong;
pub use registry::{ForceRegistry, SimulationArea};
pub use sim_thread::{is_in_sim_thread, SimThread, SimWorld};
pub use triggers::{BodyId, BodyInfo, ForcePoint, MaterialId, SkeletalTrigger, StaticTrigger, TriggerBoneInfo};
pub use volume::{effective_iterations, VolumeFluidParams, VolumeFluidState, VolumeHandle, VolumeManager};
pub use water::{HeightFieldSolver, InteractiveWater, WaterDriver, WaterFrame, WaterTick};
