//! 2D interactive water height field.
//!
//! The field is centred on a moving role (usually the player) and scrolls
//! with it. Gameplay code drives [`WaterDriver`], which produces a
//! [`WaterFrame`] per update; the [`HeightFieldSolver`] owning the buffers
//! runs that frame on the simulation thread.
//!
//! # Example
//!
//! ```
//! use fluid::water::{HeightFieldSolver, InteractiveWater};
//! use fluid::triggers::ForcePoint;
//! use glam::{UVec2, Vec2, Vec3};
//!
//! let mut water = InteractiveWater::new(1.0 / 30.0);
//! let mut solver = HeightFieldSolver::new(UVec2::splat(64));
//!
//! if water.update_time_accumulator(1.0 / 30.0) {
//!     let points = [ForcePoint::new(Vec3::new(10.0, 0.0, 0.0), 40.0)];
//!     water.update_force_params(1.0 / 30.0, Vec2::ZERO, Vec3::ZERO, 5000.0, &points);
//!     solver.update_water(&water.frame());
//! }
//! ```

mod driver;
mod solver;
mod state;

pub use driver::{WaterDriver, WaterMaterialParams, WaterTick};
pub use solver::HeightFieldSolver;
pub use state::{
    uv_to_world_delta, world_delta_to_uv, ForcePointParam, HeightTexel, InteractiveWater,
    WaterFrame,
};
