//! 3D stable-fluids volume solver.
//!
//! Each step runs, in order: advection, vorticity confinement, an external
//! impulse, divergence, a Jacobi pressure solve and the pressure projection.
//! All passes are full-grid dispatches in `8 x 8 x 8` groups on a unit grid.

pub mod passes;

mod manager;
mod state;

pub use manager::{VolumeHandle, VolumeManager};
pub use state::{effective_iterations, ImpulseConfig, VolumeFluidParams, VolumeFluidState};
