//! Decoration props (grass blades) laid out on a coarse grid over the terrain.
//!
//! Props are placed every `stride`-th terrain vertex in a raster scan. Each one
//! remembers the terrain vertex it was seeded from, but after construction its
//! height only moves when a brush lands on it.

use crate::tilemap::Tilemap;

/// Height band in which a prop is drawn. Below `min` it is buried ground
/// clutter, above `max` it would float over a ridge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityBand {
    pub min: f32,
    pub max: f32,
}

impl Default for VisibilityBand {
    fn default() -> Self {
        Self { min: 0.2, max: 3.0 }
    }
}

impl VisibilityBand {
    pub fn contains(&self, height: f32) -> bool {
        height >= self.min && height <= self.max
    }
}

/// Layout of the decoration grid relative to the terrain
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropLayout {
    /// Terrain vertices between neighboring props
    pub stride: usize,
    /// Added to the terrain height when a prop is seeded
    pub base_offset: f32,
    /// World-space side length of the terrain plane
    pub world_width: f32,
    pub band: VisibilityBand,
}

impl Default for PropLayout {
    fn default() -> Self {
        Self {
            stride: 4,
            base_offset: 0.1,
            world_width: 20.0,
            band: VisibilityBand::default(),
        }
    }
}

/// One grass blade
#[derive(Clone, Debug, PartialEq)]
pub struct PropInstance {
    /// (row, col) on the decoration grid
    pub cell: (usize, usize),
    /// Flat index of the terrain vertex the prop was seeded from
    pub terrain_index: usize,
    /// World-space placement on the terrain plane
    pub x: f32,
    pub z: f32,
    /// Current world-space height
    pub vertical_offset: f32,
    pub visible: bool,
}

impl PropInstance {
    /// Move the prop vertically and recompute visibility in the same step.
    pub fn translate(&mut self, dy: f32, band: &VisibilityBand) {
        self.vertical_offset += dy;
        self.visible = band.contains(self.vertical_offset);
    }
}

/// All props of a terrain, in raster order over the decoration grid
#[derive(Clone, Debug)]
pub struct PropField {
    resolution: usize,
    band: VisibilityBand,
    props: Vec<PropInstance>,
}

impl PropField {
    /// Seed one prop every `layout.stride` vertices of `heights`.
    ///
    /// `heights` holds world-space terrain heights. The caller is
    /// responsible for `stride` dividing the terrain side; with a
    /// non-dividing stride the decoration grid would not line up with the
    /// index formula shared with the terrain.
    pub fn seed(heights: &Tilemap<f32>, layout: &PropLayout) -> Self {
        let size = heights.width;
        let stride = layout.stride.max(1);
        let resolution = size / stride;
        let mut props = Vec::with_capacity(resolution * resolution);

        for row in 0..resolution {
            for col in 0..resolution {
                let i = row * stride;
                let j = col * stride;
                let terrain_index = i * size + j;
                let vertical_offset = *heights.at(terrain_index) + layout.base_offset;

                props.push(PropInstance {
                    cell: (row, col),
                    terrain_index,
                    x: (j as f32 / size as f32) * layout.world_width - layout.world_width / 2.0,
                    z: (i as f32 / size as f32) * layout.world_width - layout.world_width / 2.0,
                    vertical_offset,
                    visible: layout.band.contains(vertical_offset),
                });
            }
        }

        Self {
            resolution,
            band: layout.band,
            props,
        }
    }

    /// Side length of the decoration grid
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn band(&self) -> &VisibilityBand {
        &self.band
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&PropInstance> {
        self.props.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropInstance> {
        self.props.iter()
    }

    pub fn visible_count(&self) -> usize {
        self.props.iter().filter(|p| p.visible).count()
    }

    /// Translate prop `idx` by `dy`. Returns false if there is no such prop.
    pub fn translate(&mut self, idx: usize, dy: f32) -> bool {
        let band = self.band;
        match self.props.get_mut(idx) {
            Some(prop) => {
                prop.translate(dy, &band);
                true
            }
            None => false,
        }
    }
}
