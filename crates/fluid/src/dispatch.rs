//! Thread-group dispatch for per-cell kernels.
//!
//! A pass is a kernel `Fn(id) -> T` evaluated once per destination cell.
//! Work is launched as `8 x 8 x 8` (or `8 x 8`) thread groups; threads whose
//! id falls outside the grid are masked off. The CPU backend runs the kernel
//! in parallel over z-slices (3D) or rows (2D) with rayon and records every
//! launch so callers can inspect what a frame executed.

use glam::{UVec2, UVec3};
use rayon::prelude::*;

use crate::constants::THREAD_GROUP_SIZE;
use crate::grid::{Grid2, Grid3};

/// Thread groups needed to cover a 3D grid.
#[inline]
pub fn group_count_3d(size: UVec3) -> UVec3 {
    UVec3::new(
        size.x.div_ceil(THREAD_GROUP_SIZE),
        size.y.div_ceil(THREAD_GROUP_SIZE),
        size.z.div_ceil(THREAD_GROUP_SIZE),
    )
}

/// Thread groups needed to cover a 2D grid.
#[inline]
pub fn group_count_2d(size: UVec2) -> UVec2 {
    UVec2::new(
        size.x.div_ceil(THREAD_GROUP_SIZE),
        size.y.div_ceil(THREAD_GROUP_SIZE),
    )
}

/// One launched pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassRecord {
    pub label: &'static str,
    /// Group counts per axis (`z = 1` for 2D passes).
    pub groups: UVec3,
}

impl PassRecord {
    pub fn total_groups(&self) -> u64 {
        self.groups.x as u64 * self.groups.y as u64 * self.groups.z as u64
    }
}

/// Running totals across all frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub passes: u64,
    pub groups: u64,
}

/// Launches passes and keeps a log of the current frame.
#[derive(Debug, Default)]
pub struct Dispatcher {
    frame: Vec<PassRecord>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the per-frame log. Totals are kept.
    pub fn begin_frame(&mut self) {
        self.frame.clear();
    }

    /// Passes launched since the last `begin_frame`.
    pub fn passes(&self) -> &[PassRecord] {
        &self.frame
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    fn record(&mut self, label: &'static str, groups: UVec3) {
        let record = PassRecord { label, groups };
        log::trace!("dispatch {} groups={:?}", label, groups);
        self.stats.passes += 1;
        self.stats.groups += record.total_groups();
        self.frame.push(record);
    }

    /// Run `kernel` for every cell of `dst`.
    pub fn dispatch_3d<T, F>(&mut self, label: &'static str, dst: &mut Grid3<T>, kernel: F)
    where
        T: Copy + Default + Send,
        F: Fn(UVec3) -> T + Sync,
    {
        let size = dst.size();
        self.record(label, group_count_3d(size));

        let w = size.x as usize;
        let slice = w * size.y as usize;
        dst.data_mut()
            .par_chunks_mut(slice)
            .enumerate()
            .for_each(|(k, plane)| {
                for (idx, cell) in plane.iter_mut().enumerate() {
                    let id = UVec3::new((idx % w) as u32, (idx / w) as u32, k as u32);
                    *cell = kernel(id);
                }
            });
    }

    /// Run `kernel` for every texel of `dst`.
    pub fn dispatch_2d<T, F>(&mut self, label: &'static str, dst: &mut Grid2<T>, kernel: F)
    where
        T: Copy + Default + Send,
        F: Fn(UVec2) -> T + Sync,
    {
        let size = dst.size();
        self.dispatch_2d_region(label, dst, UVec2::ZERO, size, kernel);
    }

    /// Run `kernel` for texels in `[min, max)` only. Texels outside the
    /// region keep their previous contents. Groups are counted over the full
    /// texture, as a viewport-restricted launch still covers it.
    pub fn dispatch_2d_region<T, F>(
        &mut self,
        label: &'static str,
        dst: &mut Grid2<T>,
        min: UVec2,
        max: UVec2,
        kernel: F,
    ) where
        T: Copy + Default + Send,
        F: Fn(UVec2) -> T + Sync,
    {
        let size = dst.size();
        let groups = group_count_2d(size);
        self.record(label, UVec3::new(groups.x, groups.y, 1));

        let max = max.min(size);
        if min.x >= max.x || min.y >= max.y {
            return;
        }

        let w = size.x as usize;
        dst.data_mut()
            .par_chunks_mut(w)
            .enumerate()
            .filter(|(j, _)| *j as u32 >= min.y && (*j as u32) < max.y)
            .for_each(|(j, row)| {
                for i in min.x..max.x {
                    row[i as usize] = kernel(UVec2::new(i, j as u32));
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_count_rounds_up() {
        assert_eq!(group_count_3d(UVec3::splat(32)), UVec3::splat(4));
        assert_eq!(group_count_3d(UVec3::new(9, 8, 1)), UVec3::new(2, 1, 1));
        assert_eq!(group_count_2d(UVec2::new(512, 100)), UVec2::new(64, 13));
    }

    #[test]
    fn test_dispatch_3d_visits_every_cell() {
        let mut grid: Grid3<f32> = Grid3::new(5, 3, 2);
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch_3d("fill", &mut grid, |id| (id.x + 10 * id.y + 100 * id.z) as f32);

        assert_eq!(grid.get(4, 2, 1), 124.0);
        assert_eq!(grid.get(0, 1, 0), 10.0);
        assert_eq!(dispatcher.passes().len(), 1);
        assert_eq!(dispatcher.passes()[0].groups, UVec3::ONE);
    }

    #[test]
    fn test_region_leaves_border_untouched() {
        let mut grid: Grid2<f32> = Grid2::filled(6, 6, -1.0);
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch_2d_region(
            "interior",
            &mut grid,
            UVec2::ONE,
            UVec2::splat(5),
            |_| 1.0,
        );

        assert_eq!(grid.get(0, 0), -1.0);
        assert_eq!(grid.get(5, 3), -1.0);
        assert_eq!(grid.get(1, 1), 1.0);
        assert_eq!(grid.get(4, 4), 1.0);
    }

    #[test]
    fn test_begin_frame_keeps_totals() {
        let mut grid: Grid3<f32> = Grid3::new(16, 16, 16);
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch_3d("a", &mut grid, |_| 0.0);
        dispatcher.begin_frame();
        dispatcher.dispatch_3d("b", &mut grid, |_| 0.0);

        assert_eq!(dispatcher.passes().len(), 1);
        assert_eq!(dispatcher.stats().passes, 2);
        assert_eq!(dispatcher.stats().groups, 16);
    }

    #[test]
    fn test_dispatch_2d_covers_texture() {
        let mut grid: Grid2<u32> = Grid2::new(10, 3);
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch_2d("fill", &mut grid, |id| id.x + id.y * 10);

        assert_eq!(grid.get(9, 2), 29);
        assert_eq!(dispatcher.passes()[0].groups, UVec3::new(2, 1, 1));
    }
}
