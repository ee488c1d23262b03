//! Brush application: raise or lower a fixed footprint of terrain vertices
//! and keep the grass blade under the brush at the new height.

use crate::indexer::{checked_index, decoration_index, vertex_index, BrushSize, SurfaceCoord};
use crate::terrain::TerrainGrid;

/// One brush application, consumed immediately
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushRequest {
    pub coord: SurfaceCoord,
    /// Positive raises, negative lowers
    pub strength: f32,
    pub size: BrushSize,
    /// Frame time, used as the rate multiplier
    pub dt: f32,
}

impl BrushRequest {
    /// Height change per pass
    pub fn delta(&self) -> f32 {
        self.dt * self.strength
    }
}

/// What a single application did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrushReport {
    /// Center vertex, if it was inside the grid
    pub center: Option<usize>,
    /// Passes that landed on a vertex
    pub writes: usize,
    /// Passes whose vertex fell outside the buffer
    pub skipped: usize,
    /// Prop moved by this application
    pub prop: Option<usize>,
}

/// Apply `request` to `grid`.
///
/// Every offset of every tier up to `request.size` adds `dt * strength` to
/// its vertex; offsets landing outside `[0, size²)` are skipped one by one.
/// Guards are on the flat buffer only, so a horizontal neighbor of an edge
/// column lands on the adjacent row.
///
/// The prop nearest the coordinate then moves by one `dt * strength` and has
/// its visibility recomputed.
pub fn apply(grid: &mut TerrainGrid, request: &BrushRequest) -> BrushReport {
    let SurfaceCoord { u, v } = request.coord;
    let center = vertex_index(u, v, grid.size());
    let mut report = apply_footprint(grid, center, request.size, request.delta());

    let prop_resolution = grid.props().resolution();
    let prop_idx = decoration_index(u, v, prop_resolution);
    match checked_index(prop_idx, grid.props().len()) {
        Some(idx) => {
            grid.translate_prop(idx, request.delta());
            report.prop = Some(idx);
        }
        None => log::trace!("No prop at decoration index {} for ({:.4}, {:.4})", prop_idx, u, v),
    }

    report
}

/// Add `delta` at every footprint offset around a flat `center` index.
///
/// `center` may itself be out of range (see [`vertex_index`]); its passes
/// are then skipped like any other.
pub fn apply_footprint(grid: &mut TerrainGrid, center: i64, size: BrushSize, delta: f32) -> BrushReport {
    let len = grid.len();
    let mut report = BrushReport {
        center: checked_index(center, len),
        ..Default::default()
    };

    for offset in size.flat_offsets(grid.size()) {
        match center.checked_add(offset).and_then(|i| checked_index(i, len)) {
            Some(idx) => {
                grid.add_height_at(idx, delta);
                report.writes += 1;
            }
            None => report.skipped += 1,
        }
    }

    if report.skipped > 0 {
        log::debug!(
            "Brush at {} ({}) skipped {} of {} passes",
            center,
            size,
            report.skipped,
            report.writes + report.skipped
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::HeightField;
    use crate::props::PropLayout;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn flat_grid(size: usize) -> TerrainGrid {
        let field = HeightField::from_samples(size, vec![0.0; size * size]).unwrap();
        let layout = PropLayout { stride: 1, ..Default::default() };
        TerrainGrid::initialize(&field, 1.0, &layout).unwrap()
    }

    fn request(u: f32, v: f32, size: BrushSize, strength: f32, dt: f32) -> BrushRequest {
        BrushRequest { coord: SurfaceCoord::new(u, v), strength, size, dt }
    }

    fn heights(grid: &TerrainGrid) -> Vec<f32> {
        grid.heights().as_slice().to_vec()
    }

    #[test]
    fn test_single_vertex_brush() {
        let mut grid = flat_grid(4);
        let report = apply(&mut grid, &request(0.0, 1.0, BrushSize::Small, 1.0, 0.5));

        assert_eq!(report.center, Some(0));
        assert_eq!(report.writes, 1);
        let h = heights(&grid);
        assert!((h[0] - 0.5).abs() < 1e-6);
        assert!(h[1..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_medium_brush_interior() {
        let mut grid = flat_grid(4);
        // u = 0.25 -> col 1, (1 - 0.7) * 16 = 4.8 -> 5 -> row 1
        let report = apply(&mut grid, &request(0.25, 0.7, BrushSize::Medium, 1.0, 1.0));
        assert_eq!(report.center, Some(5));
        assert_eq!(report.skipped, 0);

        let h = heights(&grid);
        assert!((h[5] - 2.0).abs() < 1e-6);
        for idx in [4, 6, 1, 9] {
            assert!((h[idx] - 1.0).abs() < 1e-6, "neighbor {}", idx);
        }
        let untouched: f32 = h
            .iter()
            .enumerate()
            .filter(|(i, _)| ![5, 4, 6, 1, 9].contains(i))
            .map(|(_, x)| x.abs())
            .sum();
        assert_eq!(untouched, 0.0);
    }

    #[test]
    fn test_large_brush_tiering() {
        let mut grid = flat_grid(8);
        let (s, dt) = (0.4, 0.25);
        // center at row 3, col 3 -> index 27
        let report = apply_footprint(&mut grid, 27, BrushSize::Large, s * dt);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.writes, 1 + 5 + 13);

        let h = heights(&grid);
        let unit = s * dt;
        assert!((h[27] - 3.0 * unit).abs() < 1e-6);
        for idx in [26, 28, 19, 35] {
            assert!((h[idx] - 2.0 * unit).abs() < 1e-6, "first ring {}", idx);
        }
        for idx in [25, 29, 11, 43, 18, 20, 34, 36] {
            assert!((h[idx] - unit).abs() < 1e-6, "second ring {}", idx);
        }
        let total: f32 = h.iter().sum();
        assert!((total - 19.0 * unit).abs() < 1e-5);
    }

    #[test]
    fn test_repeated_application_is_linear() {
        let mut grid = flat_grid(16);
        let req = request(0.5, 0.5, BrushSize::Small, -0.3, 0.016);
        let center = vertex_index(0.5, 0.5, 16) as usize;
        for _ in 0..50 {
            apply(&mut grid, &req);
        }
        let expected = 50.0 * -0.3 * 0.016;
        assert!((grid.height_at(center).unwrap() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_vertical_guard_uses_grid_width() {
        // On a 4x4 grid a literal 128 guard would skip every vertical neighbor.
        let mut grid = flat_grid(4);
        apply_footprint(&mut grid, 5, BrushSize::Medium, 1.0);
        assert!((grid.height_at(1).unwrap() - 1.0).abs() < 1e-6);
        assert!((grid.height_at(9).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_corners_and_edges_stay_in_bounds() {
        let n = 4usize;
        let centers = [0, n * n - 1, n - 1, n * n - n, 1, 2, 4, 8, 7, 11, 13, 14];
        for &size in BrushSize::all() {
            for &center in &centers {
                let mut grid = flat_grid(n);
                let report = apply_footprint(&mut grid, center as i64, size, 1.0);
                assert_eq!(grid.len(), n * n);
                let total: f32 = heights(&grid).iter().sum();
                assert!((total - report.writes as f32).abs() < 1e-4);
                let expected_passes = size.flat_offsets(n).count();
                assert_eq!(report.writes + report.skipped, expected_passes);
            }
        }
    }

    #[test]
    fn test_corner_center_skips_outside_offsets() {
        let mut grid = flat_grid(4);
        let report = apply_footprint(&mut grid, 0, BrushSize::Large, 1.0);
        // Offsets that stay >= 0: 0 x3, +1 x2, +2, +4 x2, +3, +5, +8
        assert_eq!(report.writes, 11);
        assert!((grid.height_at(0).unwrap() - 3.0).abs() < 1e-6);
        assert!((grid.height_at(3).unwrap() - 1.0).abs() < 1e-6);

        let mut grid = flat_grid(4);
        let report = apply_footprint(&mut grid, 15, BrushSize::Large, 1.0);
        assert_eq!(report.center, Some(15));
        assert!((grid.height_at(15).unwrap() - 3.0).abs() < 1e-6);
        assert!((grid.height_at(11).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_range_center_writes_only_in_bounds() {
        let mut grid = flat_grid(4);
        // u = 1, v = 0 -> index 20
        let report = apply(&mut grid, &request(1.0, 0.0, BrushSize::Large, 1.0, 1.0));
        assert_eq!(report.center, None);
        // Only the upward offsets reach back into the buffer
        assert!(report.writes > 0);
        assert!((grid.height_at(12).unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(grid.len(), 16);
    }

    #[test]
    fn test_random_coords_never_escape() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..500 {
            let mut grid = flat_grid(8);
            let u: f32 = rng.gen_range(0.0..=1.0);
            let v: f32 = rng.gen_range(0.0..=1.0);
            let size = BrushSize::all()[rng.gen_range(0..3)];
            let report = apply(&mut grid, &request(u, v, size, 1.0, 1.0));
            let total: f32 = heights(&grid).iter().sum();
            assert!((total - report.writes as f32).abs() < 1e-3);
        }
    }

    #[test]
    fn test_prop_follows_brush() {
        let field = HeightField::from_samples(8, vec![0.1; 64]).unwrap();
        let mut grid = TerrainGrid::initialize(&field, 1.0, &PropLayout::default()).unwrap();
        // 0.1 + 0.1 base offset is visible
        assert!(grid.props().get(0).unwrap().visible);

        let report = apply(&mut grid, &request(0.0, 1.0, BrushSize::Large, -1.0, 0.05));
        assert_eq!(report.prop, Some(0));
        let prop = grid.props().get(0).unwrap();
        assert!((prop.vertical_offset - 0.15).abs() < 1e-6);
        assert!(!prop.visible);
        assert_eq!(grid.changes().touched_props, vec![0]);

        // Other props keep their seeded height
        assert!((grid.props().get(1).unwrap().vertical_offset - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_extreme_coords_are_skipped() {
        let coords = [
            (f32::INFINITY, 1.0),
            (1.0, f32::NEG_INFINITY),
            (f32::MAX, f32::MAX),
            (-f32::MAX, -f32::MAX),
            (f32::INFINITY, f32::NEG_INFINITY),
        ];
        for &size in BrushSize::all() {
            for &(u, v) in &coords {
                let mut grid = flat_grid(4);
                let report = apply(&mut grid, &request(u, v, size, 1.0, 1.0));
                assert_eq!(report.center, None, "({}, {}) {}", u, v, size);
                assert_eq!(report.prop, None);
                assert_eq!(report.writes + report.skipped, size.flat_offsets(4).count());
                assert_eq!(grid.len(), 16);
            }
        }
    }

    #[test]
    fn test_prop_index_out_of_range_is_skipped() {
        let mut grid = flat_grid(4);
        let report = apply(&mut grid, &request(1.0, 0.0, BrushSize::Small, 1.0, 1.0));
        assert_eq!(report.prop, None);
        assert!(grid.changes().touched_props.is_empty());
    }
}
