//! Configuration for the sculpting scene.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SculptError};
use crate::heightfield::{Channel, ResampleFilter, SampleParams};
use crate::indexer::BrushSize;
use crate::pick::ControllerId;
use crate::props::{PropLayout, VisibilityBand};

/// Brush settings bound to one hand controller
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerBinding {
    /// Signed rate: positive raises, negative lowers
    pub strength: f32,
    pub brush_size: BrushSize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerBindings {
    pub primary: ControllerBinding,
    pub secondary: ControllerBinding,
}

impl Default for ControllerBindings {
    fn default() -> Self {
        Self {
            primary: ControllerBinding { strength: 0.1, brush_size: BrushSize::Large },
            secondary: ControllerBinding { strength: -0.1, brush_size: BrushSize::Large },
        }
    }
}

/// Terrain, prop and controller parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SculptConfig {
    /// Terrain grid side length (vertices per row)
    pub resolution: usize,
    /// Multiplier from normalized samples to world height
    pub height_scale: f32,
    /// World-space side length of the terrain plane
    pub world_width: f32,
    /// Terrain vertices between neighboring grass blades
    pub prop_stride: usize,
    /// Added to the terrain height when a grass blade is placed
    pub prop_base_offset: f32,
    /// Grass is drawn only between these heights (inclusive)
    pub prop_visible_min: f32,
    pub prop_visible_max: f32,
    /// Image channel read as height
    pub channel: Channel,
    /// Smoothing used when the image side differs from `resolution`
    pub resample: ResampleFilter,
    pub controllers: ControllerBindings,
}

impl Default for SculptConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            height_scale: 5.0,
            world_width: 20.0,
            prop_stride: 4,
            prop_base_offset: 0.1,
            prop_visible_min: 0.2,
            prop_visible_max: 3.0,
            channel: Channel::Red,
            resample: ResampleFilter::Bicubic,
            controllers: ControllerBindings::default(),
        }
    }
}

impl SculptConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check the setup-time invariants. The decoration grid must line up
    /// with the terrain grid, so the stride has to divide the resolution.
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(SculptError::InvalidResolution(self.resolution));
        }
        if self.prop_stride == 0 || self.resolution % self.prop_stride != 0 {
            return Err(SculptError::InvalidConfig(format!(
                "prop_stride {} must evenly divide resolution {}",
                self.prop_stride, self.resolution
            )));
        }
        if !self.height_scale.is_finite() {
            return Err(SculptError::InvalidConfig("height_scale must be finite".to_string()));
        }
        if !self.world_width.is_finite() || self.world_width <= 0.0 {
            return Err(SculptError::InvalidConfig("world_width must be positive".to_string()));
        }
        if !(self.prop_visible_min <= self.prop_visible_max) {
            return Err(SculptError::InvalidConfig(format!(
                "prop visibility band [{}, {}] is empty",
                self.prop_visible_min, self.prop_visible_max
            )));
        }
        for &id in ControllerId::all() {
            if !self.binding(id).strength.is_finite() {
                return Err(SculptError::InvalidConfig(format!("{} strength must be finite", id)));
            }
        }
        Ok(())
    }

    /// Side length of the decoration grid
    pub fn prop_resolution(&self) -> usize {
        self.resolution / self.prop_stride.max(1)
    }

    pub fn prop_layout(&self) -> PropLayout {
        PropLayout {
            stride: self.prop_stride,
            base_offset: self.prop_base_offset,
            world_width: self.world_width,
            band: VisibilityBand {
                min: self.prop_visible_min,
                max: self.prop_visible_max,
            },
        }
    }

    pub fn sample_params(&self) -> SampleParams {
        SampleParams {
            channel: self.channel,
            filter: self.resample,
        }
    }

    pub fn binding(&self, controller: ControllerId) -> &ControllerBinding {
        match controller {
            ControllerId::Primary => &self.controllers.primary,
            ControllerId::Secondary => &self.controllers.secondary,
        }
    }
}
