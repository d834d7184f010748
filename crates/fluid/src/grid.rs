//! Dense 2D and 3D fields for the height-field and volume solvers.
//!
//! Storage is row-major with `x` fastest, then `y`, then `z`. Sampling
//! happens in two spaces:
//! - **texel space** (`sample_bilinear`, `sample_trilinear`): cell `i` sits at
//!   coordinate `i`, addressing clamps to the edge.
//! - **UV space** (`sample_uv_border`): texel `i` is centred on `(i + 0.5) / n`
//!   and everything outside the field reads as `T::default()`.

use std::ops::{Add, Mul};

use bytemuck::Pod;
use glam::{IVec2, IVec3, UVec2, UVec3, Vec2, Vec3};

/// Values the bilinear and trilinear samplers can blend.
pub trait Texel: Copy + Default + Send + Sync + Add<Output = Self> + Mul<f32, Output = Self> {}

impl<T> Texel for T where T: Copy + Default + Send + Sync + Add<Output = T> + Mul<f32, Output = T> {}

/// 2D field.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid2<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Grid2<T> {
    /// Create a field filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }

    /// Create a field filled with `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        assert!(
            width > 0 && height > 0,
            "grid dimensions must be non-zero, got {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Dimensions as a vector.
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width as u32, self.height as u32)
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Fetch with clamp-to-edge addressing.
    #[inline]
    pub fn fetch_clamped(&self, p: IVec2) -> T {
        let x = p.x.clamp(0, self.width as i32 - 1) as usize;
        let y = p.y.clamp(0, self.height as i32 - 1) as usize;
        self.get(x, y)
    }

    /// Fetch with border addressing (outside reads as `T::default()`).
    #[inline]
    pub fn fetch_border(&self, p: IVec2) -> T {
        if p.x < 0 || p.y < 0 || p.x >= self.width as i32 || p.y >= self.height as i32 {
            return T::default();
        }
        self.get(p.x as usize, p.y as usize)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Texel> Grid2<T> {
    /// Bilinear sample in texel space with clamp-to-edge addressing.
    pub fn sample_bilinear(&self, pos: Vec2) -> T {
        // Everything past the edge reads the edge texel
        let pos = pos.clamp(Vec2::splat(-1.0), self.size().as_vec2());
        let base = pos.floor();
        let t = pos - base;
        let p0 = base.as_ivec2();

        let v00 = self.fetch_clamped(p0);
        let v10 = self.fetch_clamped(p0 + IVec2::new(1, 0));
        let v01 = self.fetch_clamped(p0 + IVec2::new(0, 1));
        let v11 = self.fetch_clamped(p0 + IVec2::new(1, 1));

        let v0 = v00 * (1.0 - t.x) + v10 * t.x;
        let v1 = v01 * (1.0 - t.x) + v11 * t.x;
        v0 * (1.0 - t.y) + v1 * t.y
    }

    /// Bilinear sample in UV space with border addressing.
    pub fn sample_uv_border(&self, uv: Vec2) -> T {
        let size = self.size().as_vec2();
        let pos = (uv * size - Vec2::splat(0.5)).clamp(Vec2::splat(-2.0), size + Vec2::ONE);
        let base = pos.floor();
        let t = pos - base;
        let p0 = base.as_ivec2();

        let v00 = self.fetch_border(p0);
        let v10 = self.fetch_border(p0 + IVec2::new(1, 0));
        let v01 = self.fetch_border(p0 + IVec2::new(0, 1));
        let v11 = self.fetch_border(p0 + IVec2::new(1, 1));

        let v0 = v00 * (1.0 - t.x) + v10 * t.x;
        let v1 = v01 * (1.0 - t.x) + v11 * t.x;
        v0 * (1.0 - t.y) + v1 * t.y
    }

    /// UV coordinate of the centre of texel `(x, y)`.
    #[inline]
    pub fn texel_uv(&self, x: u32, y: u32) -> Vec2 {
        (Vec2::new(x as f32, y as f32) + Vec2::splat(0.5)) / self.size().as_vec2()
    }
}

impl<T: Pod> Grid2<T> {
    /// Raw bytes in upload order.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// 3D field.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid3<T> {
    width: usize,
    height: usize,
    depth: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Grid3<T> {
    /// Create a field filled with `T::default()`.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        assert!(
            width > 0 && height > 0 && depth > 0,
            "grid dimensions must be non-zero, got {}x{}x{}",
            width,
            height,
            depth
        );
        Self {
            width,
            height,
            depth,
            data: vec![T::default(); width * height * depth],
        }
    }

    /// Create a field with the dimensions of `size`.
    pub fn with_size(size: UVec3) -> Self {
        Self::new(size.x as usize, size.y as usize, size.z as usize)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dimensions as a vector.
    pub fn size(&self) -> UVec3 {
        UVec3::new(self.width as u32, self.height as u32, self.depth as u32)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        z * self.width * self.height + y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> T {
        self.data[self.index(x, y, z)]
    }

    /// Value at a dispatch thread id.
    #[inline]
    pub fn at(&self, id: UVec3) -> T {
        self.get(id.x as usize, id.y as usize, id.z as usize)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let idx = self.index(x, y, z);
        self.data[idx] = value;
    }

    /// Fetch with clamp-to-edge addressing.
    #[inline]
    pub fn fetch_clamped(&self, p: IVec3) -> T {
        let x = p.x.clamp(0, self.width as i32 - 1) as usize;
        let y = p.y.clamp(0, self.height as i32 - 1) as usize;
        let z = p.z.clamp(0, self.depth as i32 - 1) as usize;
        self.get(x, y, z)
    }

    /// Fetch with border addressing (outside reads as `T::default()`).
    #[inline]
    pub fn fetch_border(&self, p: IVec3) -> T {
        if p.x < 0
            || p.y < 0
            || p.z < 0
            || p.x >= self.width as i32
            || p.y >= self.height as i32
            || p.z >= self.depth as i32
        {
            return T::default();
        }
        self.get(p.x as usize, p.y as usize, p.z as usize)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T: Texel> Grid3<T> {
    /// Trilinear sample in texel space with clamp-to-edge addressing.
    pub fn sample_trilinear(&self, pos: Vec3) -> T {
        let pos = pos.clamp(Vec3::splat(-1.0), self.size().as_vec3());
        let base = pos.floor();
        let t = pos - base;
        let p0 = base.as_ivec3();

        let mut result = T::default();
        for dk in 0..2 {
            for dj in 0..2 {
                for di in 0..2 {
                    let val = self.fetch_clamped(p0 + IVec3::new(di, dj, dk));

                    let wx = if di == 0 { 1.0 - t.x } else { t.x };
                    let wy = if dj == 0 { 1.0 - t.y } else { t.y };
                    let wz = if dk == 0 { 1.0 - t.z } else { t.z };

                    result = result + val * (wx * wy * wz);
                }
            }
        }

        result
    }
}

impl Grid3<f32> {
    /// Root-mean-square of all cells.
    pub fn rms(&self) -> f32 {
        let sum: f64 = self.data.iter().map(|&v| (v as f64) * (v as f64)).sum();
        (sum / self.data.len() as f64).sqrt() as f32
    }
}

impl Grid3<Vec3> {
    /// Largest vector magnitude in the field.
    pub fn max_length(&self) -> f32 {
        self.data.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    /// True when every component of every cell is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid3_index_layout() {
        let grid: Grid3<f32> = Grid3::new(4, 3, 2);
        assert_eq!(grid.index(0, 0, 0), 0);
        assert_eq!(grid.index(1, 0, 0), 1);
        assert_eq!(grid.index(0, 1, 0), 4);
        assert_eq!(grid.index(0, 0, 1), 12);
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.size(), UVec3::new(4, 3, 2));
    }

    #[test]
    fn test_fetch_clamped_and_border() {
        let mut grid: Grid3<f32> = Grid3::new(2, 2, 2);
        grid.set(1, 1, 1, 5.0);
        assert_eq!(grid.fetch_clamped(IVec3::new(4, 9, 3)), 5.0);
        assert_eq!(grid.fetch_border(IVec3::new(2, 1, 1)), 0.0);
        assert_eq!(grid.fetch_border(IVec3::new(1, 1, 1)), 5.0);
    }

    #[test]
    fn test_trilinear_midpoint() {
        let mut grid: Grid3<f32> = Grid3::new(2, 1, 1);
        grid.set(0, 0, 0, 0.0);
        grid.set(1, 0, 0, 2.0);
        let v = grid.sample_trilinear(Vec3::new(0.5, 0.0, 0.0));
        assert!((v - 1.0).abs() < 1e-6, "expected 1.0, got {}", v);
    }

    #[test]
    fn test_trilinear_exact_at_cells() {
        let mut grid: Grid3<Vec3> = Grid3::new(3, 3, 3);
        grid.set(1, 2, 0, Vec3::new(1.0, 2.0, 3.0));
        let v = grid.sample_trilinear(Vec3::new(1.0, 2.0, 0.0));
        assert!((v - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn test_uv_border_sampling() {
        let grid: Grid2<f32> = Grid2::filled(4, 4, 1.0);
        let inside = grid.sample_uv_border(Vec2::new(0.5, 0.5));
        assert!((inside - 1.0).abs() < 1e-6);

        // Half a texel outside the edge blends with the zero border
        let edge = grid.sample_uv_border(Vec2::new(0.0, 0.5));
        assert!((edge - 0.5).abs() < 1e-6, "expected 0.5, got {}", edge);

        let outside = grid.sample_uv_border(Vec2::new(-1.0, 0.5));
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn test_texel_uv_round_trip() {
        let mut grid: Grid2<f32> = Grid2::new(8, 4);
        grid.set(3, 2, 7.0);
        let uv = grid.texel_uv(3, 2);
        assert!((grid.sample_uv_border(uv) - 7.0).abs() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "grid dimensions must be non-zero")]
    fn test_zero_size_panics() {
        let _grid: Grid3<f32> = Grid3::new(0, 4, 4);
    }

    #[test]
    fn test_far_samples_read_the_edge() {
        let mut grid: Grid3<f32> = Grid3::new(4, 4, 4);
        grid.set(3, 0, 0, 2.0);
        assert_eq!(grid.sample_trilinear(Vec3::new(1e12, 0.0, 0.0)), 2.0);
        assert_eq!(grid.sample_trilinear(Vec3::new(-1e12, 0.0, 0.0)), 0.0);
        assert_eq!(grid.sample_trilinear(Vec3::splat(f32::INFINITY)), grid.get(3, 3, 3));

        let mut plane: Grid2<f32> = Grid2::filled(4, 4, 1.0);
        plane.set(0, 0, 5.0);
        assert_eq!(plane.sample_bilinear(Vec2::splat(-1e12)), 5.0);
        assert_eq!(plane.sample_uv_border(Vec2::new(1e12, 0.5)), 0.0);
        assert_eq!(plane.sample_uv_border(Vec2::splat(-1e12)), 0.0);
    }
}
