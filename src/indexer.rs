//! Surface coordinate to grid index mapping, and the fixed brush footprints.
//!
//! Terrain and decoration lookups share one formula and differ only in the
//! grid side length, so a brush stroke and the grass it nudges always agree
//! on which cell was hit.

use serde::{Deserialize, Serialize};

/// Normalized `[0, 1]²` position on the terrain surface, as reported by a
/// ray hit. `v = 1` is the top row of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceCoord {
    pub u: f32,
    pub v: f32,
}

impl SurfaceCoord {
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

/// Map a surface coordinate to a flat index on a `size`×`size` grid.
///
/// `u` picks the column, `1 - v` picks the row, so `(0, 1)` is index 0. The
/// row term is rounded on the flattened scale and then snapped down to a
/// row boundary.
///
/// The result is NOT bounds-checked: `u` close to 1.0 rounds to
/// `col == size`, one past the last column. Use [`checked_index`] before
/// touching a buffer.
pub fn vertex_index(u: f32, v: f32, size: usize) -> i64 {
    if size == 0 {
        return 0;
    }
    let side = size as f64;
    let col = (u as f64 * side).round() as i64;
    let row_flat = ((1.0 - v as f64) * side * side).round() as i64;
    let row = row_flat.div_euclid(size as i64);
    col.saturating_add(row.saturating_mul(size as i64))
}

/// Same mapping as [`vertex_index`], on the coarser decoration grid.
pub fn decoration_index(u: f32, v: f32, prop_size: usize) -> i64 {
    vertex_index(u, v, prop_size)
}

/// `Some(idx)` if `idx` addresses a buffer of length `len`.
pub fn checked_index(idx: i64, len: usize) -> Option<usize> {
    if idx >= 0 && (idx as u64) < len as u64 {
        Some(idx as usize)
    } else {
        None
    }
}

// Offsets are (row, col). Each tier lists the vertices its pass touches,
// center included, in application order.
const TIER_1: &[(i32, i32)] = &[(0, 0)];

const TIER_2: &[(i32, i32)] = &[(0, 0), (0, -1), (0, 1), (-1, 0), (1, 0)];

const TIER_3: &[(i32, i32)] = &[
    (0, 0),
    (0, -1),
    (0, -2),
    (0, 1),
    (0, 2),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (-2, 0),
    (1, -1),
    (1, 0),
    (1, 1),
    (2, 0),
];

/// Discrete brush footprint class.
///
/// A brush of size `k` runs the passes of every tier `1..=k`. Passes are
/// cumulative, so the center is hit `k` times and the first ring `k - 1`
/// times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BrushSize {
    Small,
    Medium,
    #[default]
    Large,
}

impl BrushSize {
    pub fn all() -> &'static [Self] {
        &[Self::Small, Self::Medium, Self::Large]
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Small),
            2 => Some(Self::Medium),
            3 => Some(Self::Large),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Small => 1,
            Self::Medium => 2,
            Self::Large => 3,
        }
    }

    /// The passes this brush runs, smallest tier first.
    pub fn tiers(self) -> impl Iterator<Item = &'static [(i32, i32)]> {
        [TIER_1, TIER_2, TIER_3]
            .into_iter()
            .take(self.level() as usize)
    }

    /// Flattened offsets for a grid of side `size`, in application order.
    /// Repeated offsets are intentional; see the type docs.
    pub fn flat_offsets(self, size: usize) -> impl Iterator<Item = i64> {
        let side = size as i64;
        self.tiers()
            .flat_map(|tier| tier.iter())
            .map(move |&(dr, dc)| dr as i64 * side + dc as i64)
    }

    /// How many times each (row, col) offset is hit by one application.
    pub fn weights(self) -> Vec<((i32, i32), u32)> {
        let mut weights: Vec<((i32, i32), u32)> = Vec::new();
        for tier in self.tiers() {
            for &offset in tier {
                match weights.iter_mut().find(|(o, _)| *o == offset) {
                    Some((_, count)) => *count += 1,
                    None => weights.push((offset, 1)),
                }
            }
        }
        weights
    }
}

impl TryFrom<u8> for BrushSize {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_level(level).ok_or_else(|| format!("brush size must be 1, 2 or 3, got {}", level))
    }
}

impl From<BrushSize> for u8 {
    fn from(size: BrushSize) -> u8 {
        size.level()
    }
}

impl std::fmt::Display for BrushSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left_origin() {
        assert_eq!(vertex_index(0.0, 1.0, 4), 0);
        assert_eq!(vertex_index(0.0, 1.0, 128), 0);
    }

    #[test]
    fn test_index_is_deterministic() {
        for &(u, v) in &[(0.13, 0.77), (0.5, 0.5), (0.999, 0.001), (0.25, 0.9)] {
            let a = vertex_index(u, v, 128);
            let b = vertex_index(u, v, 128);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_row_snaps_to_boundary() {
        // (1 - 0.6) * 16 = 6.4 -> 6 -> row 1
        assert_eq!(vertex_index(0.0, 0.6, 4), 4);
        // column term is added after snapping
        assert_eq!(vertex_index(0.5, 0.6, 4), 6);
        // bottom-left corner lands one row past the grid
        assert_eq!(vertex_index(0.0, 0.0, 4), 16);
    }

    #[test]
    fn test_u_near_one_overflows_column() {
        let idx = vertex_index(1.0, 1.0, 4);
        assert_eq!(idx, 4);
        // Still in range for the buffer, but it is the next row's first vertex.
        assert_eq!(checked_index(idx, 16), Some(4));
        assert_eq!(checked_index(vertex_index(1.0, 0.0, 4), 16), None);
    }

    #[test]
    fn test_decoration_uses_same_formula() {
        assert_eq!(decoration_index(0.5, 0.5, 32), vertex_index(0.5, 0.5, 32));
        assert_ne!(decoration_index(0.5, 0.5, 32), vertex_index(0.5, 0.5, 128));
    }

    #[test]
    fn test_checked_index_rejects_negative() {
        assert_eq!(checked_index(-1, 16), None);
        assert_eq!(checked_index(15, 16), Some(15));
        assert_eq!(checked_index(16, 16), None);
    }

    #[test]
    fn test_tier_weights() {
        let weights = BrushSize::Large.weights();
        let weight_of = |o: (i32, i32)| weights.iter().find(|(w, _)| *w == o).map(|(_, c)| *c);

        assert_eq!(weight_of((0, 0)), Some(3));
        for o in [(0, -1), (0, 1), (-1, 0), (1, 0)] {
            assert_eq!(weight_of(o), Some(2), "first ring {:?}", o);
        }
        for o in [(0, -2), (0, 2), (-2, 0), (2, 0), (-1, -1), (-1, 1), (1, -1), (1, 1)] {
            assert_eq!(weight_of(o), Some(1), "second ring {:?}", o);
        }
        assert_eq!(weights.len(), 13);

        assert_eq!(BrushSize::Small.weights(), vec![((0, 0), 1)]);
        assert_eq!(BrushSize::Medium.weights().len(), 5);
    }

    #[test]
    fn test_flat_offsets_use_grid_width() {
        let offsets: Vec<i64> = BrushSize::Medium.flat_offsets(4).collect();
        assert_eq!(offsets, vec![0, 0, -1, 1, -4, 4]);

        let wide: Vec<i64> = BrushSize::Large.flat_offsets(128).collect();
        assert!(wide.contains(&-127));
        assert!(wide.contains(&256));
    }

    #[test]
    fn test_brush_size_serde_levels() {
        assert_eq!(serde_json::to_string(&BrushSize::Medium).unwrap(), "2");
        let size: BrushSize = serde_json::from_str("1").unwrap();
        assert_eq!(size, BrushSize::Small);
        assert!(serde_json::from_str::<BrushSize>("4").is_err());
    }
}
