//! Dispatch model tests
//!
//! Group counts, per-pass records and Jacobi buffer parity across random
//! grid sizes.

use fluid::grid::{Grid2, Grid3};
use fluid::volume::passes;
use fluid::{effective_iterations, group_count_2d, group_count_3d, Dispatcher, PingPong};
use glam::{UVec2, UVec3};
use proptest::prelude::*;

fn ceil_div(n: u32, d: u32) -> u32 {
    (n + d - 1) / d
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: group counts cover the grid with less than one spare group per axis
    #[test]
    fn test_group_count_3d_is_ceiling(x in 1u32..300, y in 1u32..300, z in 1u32..300) {
        let groups = group_count_3d(UVec3::new(x, y, z));
        prop_assert_eq!(groups, UVec3::new(ceil_div(x, 8), ceil_div(y, 8), ceil_div(z, 8)));
        prop_assert!(groups.x * 8 >= x && (groups.x - 1) * 8 < x);
    }

    #[test]
    fn test_group_count_2d_is_ceiling(x in 1u32..2048, y in 1u32..2048) {
        let groups = group_count_2d(UVec2::new(x, y));
        prop_assert_eq!(groups, UVec2::new(ceil_div(x, 8), ceil_div(y, 8)));
    }

    /// Property: the recorded pass matches the grid it ran over
    #[test]
    fn test_dispatch_records_group_count(x in 1usize..20, y in 1usize..20, z in 1usize..20) {
        let mut grid: Grid3<f32> = Grid3::new(x, y, z);
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch_3d("fill", &mut grid, |_| 1.0);

        let record = dispatcher.passes()[0];
        prop_assert_eq!(record.groups, group_count_3d(grid.size()));
        prop_assert!(grid.data().iter().all(|&v| v == 1.0), "every cell must be written");
    }

    /// Property: the masked Jacobi count is even and lands back on the start buffer
    #[test]
    fn test_jacobi_parity(requested in 0u32..40) {
        let iterations = effective_iterations(requested);
        prop_assert_eq!(iterations % 2, 0);
        prop_assert!(requested - iterations <= 1);

        let mut dispatcher = Dispatcher::new();
        let divergence: Grid3<f32> = Grid3::new(4, 4, 4);
        let mut pressure = PingPong::from_prototype(Grid3::<f32>::new(4, 4, 4));
        let start = pressure.index();
        passes::jacobi(&mut dispatcher, iterations, &divergence, &mut pressure);

        prop_assert_eq!(pressure.index(), start);
        prop_assert_eq!(dispatcher.passes().len(), iterations as usize);
    }
}

/// A viewport-restricted pass still counts groups over the whole texture
#[test]
fn test_region_pass_counts_full_texture() {
    let mut grid: Grid2<f32> = Grid2::new(100, 36);
    let mut dispatcher = Dispatcher::new();
    dispatcher.dispatch_2d_region("interior", &mut grid, UVec2::ONE, UVec2::new(99, 35), |_| 2.0);

    assert_eq!(dispatcher.passes()[0].groups, UVec3::new(13, 5, 1));
    assert_eq!(grid.get(0, 10), 0.0, "border column must be untouched");
    assert_eq!(grid.get(50, 10), 2.0);
}

/// Totals keep growing across frames while the per-frame log resets
#[test]
fn test_stats_accumulate_across_frames() {
    let mut grid: Grid3<f32> = Grid3::new(9, 9, 9);
    let mut dispatcher = Dispatcher::new();
    for _ in 0..3 {
        dispatcher.begin_frame();
        dispatcher.dispatch_3d("a", &mut grid, |_| 0.0);
        dispatcher.dispatch_3d("b", &mut grid, |_| 0.0);
    }

    assert_eq!(dispatcher.passes().len(), 2);
    let stats = dispatcher.stats();
    assert_eq!(stats.passes, 6);
    assert_eq!(stats.groups, 6 * 8, "9^3 needs 2x2x2 groups per pass");
}
