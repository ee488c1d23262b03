//! Height field construction from a grayscale source image.
//!
//! A height field is the immutable seed of the terrain: one normalized sample
//! per vertex, row-major, built once when the source image is available.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use noise::{NoiseFn, Perlin, Seedable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SculptError};
use crate::tilemap::Tilemap;

/// Which image channel becomes the height sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Red,
    Green,
    Blue,
    Alpha,
    /// Perceptual luminance of the RGB channels
    Luma,
}

impl Channel {
    /// Offset of the channel inside an RGBA pixel
    fn rgba_offset(self) -> Option<usize> {
        match self {
            Self::Red => Some(0),
            Self::Green => Some(1),
            Self::Blue => Some(2),
            Self::Alpha => Some(3),
            Self::Luma => None,
        }
    }
}

/// Smoothing used when the source side differs from the grid resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    Nearest,
    Bilinear,
    #[default]
    Bicubic,
    Lanczos,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => FilterType::Nearest,
            ResampleFilter::Bilinear => FilterType::Triangle,
            ResampleFilter::Bicubic => FilterType::CatmullRom,
            ResampleFilter::Lanczos => FilterType::Lanczos3,
        }
    }
}

/// Parameters for turning an image into samples
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SampleParams {
    pub channel: Channel,
    pub filter: ResampleFilter,
}

/// Square grid of normalized height samples in `[0, 1]`
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    samples: Tilemap<f32>,
}

impl HeightField {
    /// Sample `image` onto a `resolution`×`resolution` grid.
    ///
    /// The image must be square. If its side already equals `resolution`
    /// the pixels are used as-is, otherwise it is resampled with
    /// `params.filter` first.
    pub fn build(image: &DynamicImage, resolution: usize, params: SampleParams) -> Result<Self> {
        if resolution == 0 {
            return Err(SculptError::InvalidResolution(resolution));
        }
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(SculptError::EmptyImage);
        }
        if width != height {
            return Err(SculptError::NotSquare { width, height });
        }

        let side = resolution as u32;
        let resized;
        let source = if width == side {
            image
        } else {
            resized = image.resize_exact(side, side, params.filter.into());
            &resized
        };

        let samples = if is_wide(source) {
            channel_samples_16(source, params.channel)
        } else {
            channel_samples_8(source, params.channel)
        };

        Self::from_samples(resolution, samples)
    }

    /// Decode an encoded image (PNG, JPEG, ...) and sample it.
    pub fn decode(bytes: &[u8], resolution: usize, params: SampleParams) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        Self::build(&image, resolution, params)
    }

    /// Open an image file and sample it.
    pub fn open<P: AsRef<Path>>(path: P, resolution: usize, params: SampleParams) -> Result<Self> {
        let image = image::open(path)?;
        Self::build(&image, resolution, params)
    }

    /// Wrap already-normalized samples. Every sample must be in `[0, 1]`.
    pub fn from_samples(resolution: usize, samples: Vec<f32>) -> Result<Self> {
        if resolution == 0 {
            return Err(SculptError::InvalidResolution(resolution));
        }
        let expected = resolution * resolution;
        let actual = samples.len();
        if actual != expected {
            return Err(SculptError::SampleCount { expected, actual });
        }
        if let Some((index, &value)) = samples
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(SculptError::SampleOutOfRange { index, value });
        }

        let samples = Tilemap::from_vec(resolution, resolution, samples)
            .ok_or(SculptError::SampleCount { expected, actual })?;
        Ok(Self { samples })
    }

    /// Procedural height field from fractal Perlin noise, normalized to `[0, 1]`.
    pub fn synthetic(resolution: usize, seed: u64) -> Result<Self> {
        if resolution == 0 {
            return Err(SculptError::InvalidResolution(resolution));
        }
        let noise = Perlin::new(1).set_seed(seed as u32);
        let side = resolution as f64;

        let raw: Vec<f32> = (0..resolution * resolution)
            .into_par_iter()
            .map(|idx| {
                let x = (idx % resolution) as f64 / side * SYNTHETIC_FREQUENCY;
                let y = (idx / resolution) as f64 / side * SYNTHETIC_FREQUENCY;
                fbm(&noise, x, y, SYNTHETIC_OCTAVES, 0.5, 2.0) as f32
            })
            .collect();

        let (min_val, max_val) = raw
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max_val - min_val;
        let samples = if range < 0.0001 {
            vec![0.0; raw.len()]
        } else {
            raw.iter().map(|v| ((v - min_val) / range).clamp(0.0, 1.0)).collect()
        };

        Self::from_samples(resolution, samples)
    }

    pub fn resolution(&self) -> usize {
        self.samples.width
    }

    pub fn samples(&self) -> &[f32] {
        self.samples.as_slice()
    }

    pub fn as_tilemap(&self) -> &Tilemap<f32> {
        &self.samples
    }
}

const SYNTHETIC_FREQUENCY: f64 = 3.0;
const SYNTHETIC_OCTAVES: u32 = 5;

/// True for sources with more than 8 bits per channel
fn is_wide(image: &DynamicImage) -> bool {
    let color = image.color();
    color.bytes_per_pixel() / color.channel_count() > 1
}

fn channel_samples_8(image: &DynamicImage, channel: Channel) -> Vec<f32> {
    let max = u8::MAX as f32;
    match channel.rgba_offset() {
        Some(offset) => image
            .to_rgba8()
            .into_raw()
            .par_chunks_exact(4)
            .map(|px| px[offset] as f32 / max)
            .collect(),
        None => image
            .to_luma8()
            .into_raw()
            .par_iter()
            .map(|&l| l as f32 / max)
            .collect(),
    }
}

fn channel_samples_16(image: &DynamicImage, channel: Channel) -> Vec<f32> {
    let max = u16::MAX as f32;
    match channel.rgba_offset() {
        Some(offset) => image
            .to_rgba16()
            .into_raw()
            .par_chunks_exact(4)
            .map(|px| px[offset] as f32 / max)
            .collect(),
        None => image
            .to_luma16()
            .into_raw()
            .par_iter()
            .map(|&l| l as f32 / max)
            .collect(),
    }
}

/// Fractal Brownian motion - sum of octaves
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}
