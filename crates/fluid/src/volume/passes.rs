//! Stable-fluids kernels on a unit-spaced voxel grid.
//!
//! Each function is one dispatch: it reads its source fields, writes one
//! destination grid and records the launch on the [`Dispatcher`]. Neighbour
//! fetches clamp to the edge unless noted otherwise.

use glam::{IVec3, UVec3, Vec3};

use crate::constants::CONFINEMENT_EPSILON;
use crate::dispatch::Dispatcher;
use crate::grid::{Grid3, Texel};
use crate::pingpong::PingPong;

/// Semi-Lagrangian advection: `dst(x) = src(x - dt * velocity(x))`.
pub fn advect<T: Texel>(
    dispatcher: &mut Dispatcher,
    label: &'static str,
    time_step: f32,
    velocity: &Grid3<Vec3>,
    src: &Grid3<T>,
    dst: &mut Grid3<T>,
) {
    dispatcher.dispatch_3d(label, dst, |id| {
        let back = id.as_vec3() - time_step * velocity.at(id);
        src.sample_trilinear(back)
    });
}

/// Curl of `velocity` by central differences.
pub fn vorticity(
    dispatcher: &mut Dispatcher,
    halfrdx: f32,
    velocity: &Grid3<Vec3>,
    dst: &mut Grid3<Vec3>,
) {
    dispatcher.dispatch_3d("vorticity", dst, |id| {
        let p = id.as_ivec3();
        let l = velocity.fetch_clamped(p - IVec3::X);
        let r = velocity.fetch_clamped(p + IVec3::X);
        let b = velocity.fetch_clamped(p - IVec3::Y);
        let t = velocity.fetch_clamped(p + IVec3::Y);
        let k = velocity.fetch_clamped(p - IVec3::Z);
        let f = velocity.fetch_clamped(p + IVec3::Z);

        halfrdx
            * Vec3::new(
                (t.z - b.z) - (f.y - k.y),
                (f.x - k.x) - (r.z - l.z),
                (r.y - l.y) - (t.x - b.x),
            )
    });
}

/// Vorticity confinement: `vel + dt * scale * (N x w)` with
/// `N = normalize(grad |w|)`.
pub fn vorticity_force(
    dispatcher: &mut Dispatcher,
    halfrdx: f32,
    time_step: f32,
    confinement_scale: f32,
    vorticity: &Grid3<Vec3>,
    velocity: &Grid3<Vec3>,
    dst: &mut Grid3<Vec3>,
) {
    dispatcher.dispatch_3d("vorticity_force", dst, |id| {
        let p = id.as_ivec3();
        let mag = |o: IVec3| vorticity.fetch_clamped(p + o).length();

        let eta = halfrdx
            * Vec3::new(
                mag(IVec3::X) - mag(-IVec3::X),
                mag(IVec3::Y) - mag(-IVec3::Y),
                mag(IVec3::Z) - mag(-IVec3::Z),
            );
        let n = eta / (eta.length() + CONFINEMENT_EPSILON);
        let force = confinement_scale * n.cross(vorticity.at(id));

        velocity.at(id) + time_step * force
    });
}

/// Add `value * exp(-d^2 / radius)` to every voxel within `radius` of `position`.
pub fn add_impulse(
    dispatcher: &mut Dispatcher,
    label: &'static str,
    position: UVec3,
    radius: f32,
    value: Vec3,
    src: &Grid3<Vec3>,
    dst: &mut Grid3<Vec3>,
) {
    let centre = position.as_vec3();
    dispatcher.dispatch_3d(label, dst, |id| {
        let d = id.as_vec3().distance(centre);
        let base = src.at(id);
        if d < radius {
            base + value * (-(d * d) / radius).exp()
        } else {
            base
        }
    });
}

/// Divergence by central differences. Velocity outside the grid is zero.
pub fn divergence(
    dispatcher: &mut Dispatcher,
    halfrdx: f32,
    velocity: &Grid3<Vec3>,
    dst: &mut Grid3<f32>,
) {
    dispatcher.dispatch_3d("divergence", dst, |id| {
        let p = id.as_ivec3();
        let l = velocity.fetch_border(p - IVec3::X);
        let r = velocity.fetch_border(p + IVec3::X);
        let b = velocity.fetch_border(p - IVec3::Y);
        let t = velocity.fetch_border(p + IVec3::Y);
        let k = velocity.fetch_border(p - IVec3::Z);
        let f = velocity.fetch_border(p + IVec3::Z);

        halfrdx * ((r.x - l.x) + (t.y - b.y) + (f.z - k.z))
    });
}

/// `iterations` Jacobi sweeps of `lap(p) = div`, ping-ponging `pressure`.
///
/// Odd counts leave the result in the other physical buffer; callers that
/// need it in place pass an even count.
pub fn jacobi(
    dispatcher: &mut Dispatcher,
    iterations: u32,
    divergence: &Grid3<f32>,
    pressure: &mut PingPong<Grid3<f32>>,
) {
    for _ in 0..iterations {
        let (src, dst) = pressure.split();
        dispatcher.dispatch_3d("jacobi", dst, |id| {
            let p = id.as_ivec3();
            let sum = src.fetch_clamped(p - IVec3::X)
                + src.fetch_clamped(p + IVec3::X)
                + src.fetch_clamped(p - IVec3::Y)
                + src.fetch_clamped(p + IVec3::Y)
                + src.fetch_clamped(p - IVec3::Z)
                + src.fetch_clamped(p + IVec3::Z);
            (sum - divergence.at(id)) / 6.0
        });
        pressure.swap();
    }
}

/// Projection: `vel - halfrdx * grad p`.
pub fn subtract_gradient(
    dispatcher: &mut Dispatcher,
    halfrdx: f32,
    pressure: &Grid3<f32>,
    velocity: &Grid3<Vec3>,
    dst: &mut Grid3<Vec3>,
) {
    dispatcher.dispatch_3d("subtract_gradient", dst, |id| {
        let p = id.as_ivec3();
        let grad = Vec3::new(
            pressure.fetch_clamped(p + IVec3::X) - pressure.fetch_clamped(p - IVec3::X),
            pressure.fetch_clamped(p + IVec3::Y) - pressure.fetch_clamped(p - IVec3::Y),
            pressure.fetch_clamped(p + IVec3::Z) - pressure.fetch_clamped(p - IVec3::Z),
        );
        velocity.at(id) - halfrdx * grad
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HALF_RDX;

    #[test]
    fn test_advect_uniform_flow_shifts_field() {
        let mut d = Dispatcher::new();
        let mut velocity: Grid3<Vec3> = Grid3::new(8, 8, 8);
        velocity.fill(Vec3::X);
        let mut src: Grid3<f32> = Grid3::new(8, 8, 8);
        src.set(3, 4, 4, 1.0);
        let mut dst: Grid3<f32> = Grid3::new(8, 8, 8);

        advect(&mut d, "advect", 1.0, &velocity, &src, &mut dst);
        assert!((dst.get(4, 4, 4) - 1.0).abs() < 1e-6);
        assert_eq!(dst.get(3, 4, 4), 0.0);
    }

    #[test]
    fn test_vorticity_of_rigid_rotation() {
        let mut d = Dispatcher::new();
        let mut velocity: Grid3<Vec3> = Grid3::new(8, 8, 8);
        for k in 0..8 {
            for j in 0..8 {
                for i in 0..8 {
                    // Rotation about z with unit angular speed
                    velocity.set(i, j, k, Vec3::new(-(j as f32), i as f32, 0.0));
                }
            }
        }
        let mut w: Grid3<Vec3> = Grid3::new(8, 8, 8);
        vorticity(&mut d, HALF_RDX, &velocity, &mut w);
        let interior = w.get(4, 4, 4);
        assert!((interior - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5, "got {:?}", interior);
    }

    #[test]
    fn test_impulse_only_inside_radius() {
        let mut d = Dispatcher::new();
        let src: Grid3<Vec3> = Grid3::new(16, 16, 16);
        let mut dst: Grid3<Vec3> = Grid3::new(16, 16, 16);
        add_impulse(&mut d, "impulse", UVec3::splat(8), 3.0, Vec3::Y, &src, &mut dst);

        assert_eq!(dst.get(8, 8, 8), Vec3::Y);
        assert_eq!(dst.get(8, 8, 12), Vec3::ZERO);
        assert!(dst.get(9, 8, 8).y > 0.0 && dst.get(9, 8, 8).y < 1.0);
    }

    #[test]
    fn test_jacobi_even_count_returns_to_start_buffer() {
        let mut d = Dispatcher::new();
        let div: Grid3<f32> = Grid3::new(8, 8, 8);
        let mut pressure = PingPong::from_prototype(Grid3::new(8, 8, 8));
        let start = pressure.index();
        jacobi(&mut d, 4, &div, &mut pressure);
        assert_eq!(pressure.index(), start);
        assert_eq!(d.passes().len(), 4);
    }

    #[test]
    fn test_constant_pressure_leaves_velocity() {
        let mut d = Dispatcher::new();
        let mut pressure: Grid3<f32> = Grid3::new(8, 8, 8);
        pressure.fill(3.0);
        let mut velocity: Grid3<Vec3> = Grid3::new(8, 8, 8);
        velocity.fill(Vec3::new(1.0, 2.0, 3.0));
        let mut dst: Grid3<Vec3> = Grid3::new(8, 8, 8);
        subtract_gradient(&mut d, HALF_RDX, &pressure, &velocity, &mut dst);
        assert!(dst.data().iter().all(|v| *v == Vec3::new(1.0, 2.0, 3.0)));
    }
}
