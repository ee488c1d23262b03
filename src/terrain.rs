//! Live terrain state: the editable height buffer and the props riding on it.

use rayon::prelude::*;

use crate::error::{Result, SculptError};
use crate::heightfield::HeightField;
use crate::props::{PropField, PropLayout};
use crate::tilemap::Tilemap;

/// What changed since the renderer last looked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    /// The height buffer needs re-uploading
    pub heights_dirty: bool,
    /// Lowest and highest height index written
    pub dirty_span: Option<(usize, usize)>,
    /// Props whose transform changed, in first-touch order
    pub touched_props: Vec<usize>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        !self.heights_dirty && self.touched_props.is_empty()
    }

    fn mark_height(&mut self, idx: usize) {
        self.heights_dirty = true;
        self.dirty_span = Some(match self.dirty_span {
            Some((lo, hi)) => (lo.min(idx), hi.max(idx)),
            None => (idx, idx),
        });
    }

    fn mark_prop(&mut self, idx: usize) {
        if !self.touched_props.contains(&idx) {
            self.touched_props.push(idx);
        }
    }
}

/// Editable terrain seeded from a [`HeightField`]
#[derive(Clone, Debug)]
pub struct TerrainGrid {
    height_scale: f32,
    heights: Tilemap<f32>,
    props: PropField,
    changes: ChangeSet,
}

impl TerrainGrid {
    /// Scale the height field into world heights and seed the props.
    ///
    /// Fails if the prop stride does not evenly divide the grid side, since
    /// decoration lookups would then drift from the terrain cells.
    pub fn initialize(field: &HeightField, height_scale: f32, layout: &PropLayout) -> Result<Self> {
        let size = field.resolution();
        if layout.stride == 0 || size % layout.stride != 0 {
            return Err(SculptError::InvalidConfig(format!(
                "prop stride {} does not divide terrain resolution {}",
                layout.stride, size
            )));
        }

        let scaled: Vec<f32> = field.samples().par_iter().map(|s| s * height_scale).collect();
        let heights = Tilemap::from_vec(size, size, scaled).ok_or(SculptError::SampleCount {
            expected: size * size,
            actual: field.samples().len(),
        })?;
        let props = PropField::seed(&heights, layout);

        Ok(Self {
            height_scale,
            heights,
            props,
            changes: ChangeSet::default(),
        })
    }

    /// Side length of the grid
    pub fn size(&self) -> usize {
        self.heights.width
    }

    pub fn height_scale(&self) -> f32 {
        self.height_scale
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Height at flat index `idx`, or `None` past the end
    pub fn height_at(&self, idx: usize) -> Option<f32> {
        self.heights.as_slice().get(idx).copied()
    }

    /// Overwrite one height. Returns false (and writes nothing) if `idx`
    /// is out of range.
    pub fn set_height_at(&mut self, idx: usize, value: f32) -> bool {
        if idx >= self.heights.len() {
            return false;
        }
        *self.heights.at_mut(idx) = value;
        self.changes.mark_height(idx);
        true
    }

    /// Add `delta` to one height through [`Self::set_height_at`].
    pub(crate) fn add_height_at(&mut self, idx: usize, delta: f32) -> bool {
        match self.height_at(idx) {
            Some(h) => self.set_height_at(idx, h + delta),
            None => false,
        }
    }

    pub fn heights(&self) -> &Tilemap<f32> {
        &self.heights
    }

    pub fn props(&self) -> &PropField {
        &self.props
    }

    /// Translate one prop. Returns false if there is no such prop.
    pub fn translate_prop(&mut self, idx: usize, dy: f32) -> bool {
        if self.props.translate(idx, dy) {
            self.changes.mark_prop(idx);
            true
        } else {
            false
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Hand the pending changes to the caller and start a fresh set.
    pub fn take_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }
}
