//! Numeric constants shared by the water and volume solvers.
//!
//! ## Conventions
//!
//! 1. **Dispatch** - every grid pass runs in thread groups of
//!    `THREAD_GROUP_SIZE` cells per axis, so a pass over an `X x Y x Z` grid
//!    launches `ceil(X/8) * ceil(Y/8) * ceil(Z/8)` groups.
//! 2. **Grid spacing** - the volume solver assumes unit spacing, so finite
//!    differences use `HALF_RDX = 0.5 / dx = 0.5`.
//! 3. **Height-field UV space** - world offsets map to UV with
//!    `(dy / area, -dx / area)`.

/// Cells per thread-group axis for every dispatch.
pub const THREAD_GROUP_SIZE: u32 = 8;

/// Half reciprocal grid spacing used by curl, divergence and gradient passes.
pub const HALF_RDX: f32 = 0.5;

// =============================================================================
// HEIGHT-FIELD WATER
// =============================================================================

/// Wave attenuation applied on ticks where the fixed-period accumulator fired.
pub const ACTIVE_ATTENUATION: f32 = 0.925;

/// Wave attenuation on ticks between updates (waves hold steady).
pub const IDLE_ATTENUATION: f32 = 1.0;

/// Distance from the field centre (in UV) the tracked role may drift before
/// the field is re-centred.
pub const ROLE_OFFSET_TOLERANCE: f32 = 0.15;

/// UV move direction used when the owner moved but the UV delta rounds to zero.
pub const MIN_MOVE_UV: f32 = 1.0e-4;

/// UV delta length at or below which the owner counts as not moving.
pub const NEARLY_ZERO: f32 = 1.0e-8;

/// Disturbance height injected per force point when none is configured.
pub const DEFAULT_FORCE_STRENGTH: f32 = 1.0;

/// Height-field resolution per axis.
pub const DEFAULT_FIELD_SIZE: u32 = 512;

/// World-space footprint of the height field.
pub const DEFAULT_INTERACTIVE_AREA_SIZE: f32 = 5000.0;

/// Height-field updates per second.
pub const DEFAULT_ITERATIONS_PER_SECOND: f32 = 30.0;

/// Seconds without force points before an idle field stops simulating.
pub const DEFAULT_STOP_SIMULATION_THRESHOLD: f32 = 10.0;

/// Movement (world units) a static trigger needs before it reports again.
pub const DEFAULT_STATIC_OFFSET_TOLERANCE: f32 = 1.0;

// =============================================================================
// VOLUME FLUID
// =============================================================================

/// Voxels per axis of a freshly configured volume.
pub const DEFAULT_VOLUME_SIZE: u32 = 128;

/// Jacobi iterations requested per frame (rounded down to even when used).
pub const DEFAULT_JACOBI_ITERATIONS: u32 = 20;

/// Vorticity confinement strength.
pub const DEFAULT_VORTICITY_SCALE: f32 = 0.2;

/// Force injected into velocity by the impulse pass.
pub const DEFAULT_IMPULSE_FORCE: [f32; 3] = [0.0, 80.0, 0.0];

/// Dye injected into color by the impulse pass.
pub const DEFAULT_IMPULSE_COLOR: [f32; 3] = [1.0, 1.0, 1.6];

/// Voxel height of the impulse source above the volume floor.
pub const DEFAULT_IMPULSE_HEIGHT: u32 = 20;

/// Impulse radius in voxels.
pub const DEFAULT_IMPULSE_RADIUS: f32 = 20.0;

/// Keeps the confinement direction finite where the vorticity gradient vanishes.
pub const CONFINEMENT_EPSILON: f32 = 1.0e-5;
