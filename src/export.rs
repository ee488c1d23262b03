//! Preview images of the live terrain, for inspecting a session offline.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::terrain::TerrainGrid;
use crate::tilemap::Tilemap;

const PROP_COLOR: [u8; 3] = [40, 160, 40];

/// Spectral colormap (matplotlib style): dark blue -> cyan -> green -> yellow -> orange -> red
fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 11] = [
        [0.37, 0.31, 0.64],  // Dark blue/purple (low)
        [0.20, 0.53, 0.74],  // Blue
        [0.40, 0.76, 0.65],  // Teal
        [0.67, 0.87, 0.64],  // Light green
        [0.90, 0.96, 0.60],  // Yellow-green
        [1.00, 1.00, 0.75],  // Light yellow / white
        [1.00, 0.88, 0.55],  // Yellow
        [0.99, 0.68, 0.38],  // Light orange
        [0.96, 0.43, 0.26],  // Orange
        [0.84, 0.24, 0.31],  // Red
        [0.62, 0.00, 0.26],  // Dark red (high)
    ];

    let t_scaled = t.clamp(0.0, 1.0) * 10.0;
    let idx = (t_scaled as usize).min(9);
    let frac = t_scaled - idx as f32;

    let c1 = colors[idx];
    let c2 = colors[idx + 1];

    [
        ((c1[0] + (c2[0] - c1[0]) * frac) * 255.0) as u8,
        ((c1[1] + (c2[1] - c1[1]) * frac) * 255.0) as u8,
        ((c1[2] + (c2[2] - c1[2]) * frac) * 255.0) as u8,
    ]
}

/// Normalize to 0-1, or `None` if the map is flat
fn normalized(heights: &Tilemap<f32>) -> Option<Tilemap<f32>> {
    let (min_val, max_val) = heights.min_max()?;
    let range = max_val - min_val;
    if range < 0.001 {
        return None;
    }
    Some(heights.map(|&h| (h - min_val) / range))
}

/// Render terrain heights with the spectral colormap.
/// A flat terrain renders as uniform gray.
pub fn render_heightmap(grid: &TerrainGrid) -> RgbImage {
    let heights = grid.heights();
    let mut img: RgbImage = ImageBuffer::new(heights.width as u32, heights.height as u32);

    let norm = match normalized(heights) {
        Some(norm) => norm,
        None => {
            for px in img.pixels_mut() {
                *px = Rgb([128, 128, 128]);
            }
            return img;
        }
    };

    for (x, y, &val) in norm.iter() {
        img.put_pixel(x as u32, y as u32, Rgb(spectral_colormap(val)));
    }
    img
}

/// Render terrain with hillshade (fake 3D shadows) over the colormap
pub fn render_shaded(grid: &TerrainGrid) -> RgbImage {
    let heights = grid.heights();
    let mut img = render_heightmap(grid);

    // Light direction (from northwest, elevated)
    let light_dir: [f32; 3] = normalize_vec3(-1.0, -1.0, 2.0);

    for y in 0..heights.height {
        for x in 0..heights.width {
            let normal = calculate_normal(heights, x, y);

            let diffuse = (normal[0] * light_dir[0] + normal[1] * light_dir[1] + normal[2] * light_dir[2])
                .max(0.0);

            let ambient = 0.4;
            let shade = ambient + (1.0 - ambient) * diffuse;

            let base = img.get_pixel(x as u32, y as u32).0;
            let r = ((base[0] as f32 * shade).clamp(0.0, 255.0)) as u8;
            let g = ((base[1] as f32 * shade).clamp(0.0, 255.0)) as u8;
            let b = ((base[2] as f32 * shade).clamp(0.0, 255.0)) as u8;

            img.put_pixel(x as u32, y as u32, Rgb([r, g, b]));
        }
    }

    img
}

/// Calculate surface normal from the height gradient, clamping at the edges
fn calculate_normal(heights: &Tilemap<f32>, x: usize, y: usize) -> [f32; 3] {
    let x_left = x.saturating_sub(1);
    let x_right = (x + 1).min(heights.width - 1);
    let y_up = y.saturating_sub(1);
    let y_down = (y + 1).min(heights.height - 1);

    let h_left = *heights.get(x_left, y);
    let h_right = *heights.get(x_right, y);
    let h_up = *heights.get(x, y_up);
    let h_down = *heights.get(x, y_down);

    // Heights are a few world units over ~100 cells
    let height_scale = 4.0;
    let dx = (h_right - h_left) * height_scale;
    let dy = (h_down - h_up) * height_scale;

    // Note: dy sign is inverted because image Y increases downward
    normalize_vec3(-dx, dy, 1.0)
}

fn normalize_vec3(x: f32, y: f32, z: f32) -> [f32; 3] {
    let len = (x * x + y * y + z * z).sqrt();
    [x / len, y / len, z / len]
}

/// Mark every visible prop at its backing terrain vertex
pub fn overlay_props(grid: &TerrainGrid, img: &mut RgbImage) {
    let size = grid.size();
    for prop in grid.props().iter().filter(|p| p.visible) {
        let x = (prop.terrain_index % size) as u32;
        let y = (prop.terrain_index / size) as u32;
        if x < img.width() && y < img.height() {
            img.put_pixel(x, y, Rgb(PROP_COLOR));
        }
    }
}

/// Write a preview PNG of the terrain.
pub fn save_preview<P: AsRef<Path>>(
    grid: &TerrainGrid,
    path: P,
    shaded: bool,
    show_props: bool,
) -> Result<(), image::ImageError> {
    let mut img = if shaded { render_shaded(grid) } else { render_heightmap(grid) };
    if show_props {
        overlay_props(grid, &mut img);
    }
    img.save(path)
}
