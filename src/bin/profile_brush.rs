//! Profiling tool for brush application cost against the frame budget

use std::time::{Duration, Instant};

use terrain_sculptor::brush::{self, BrushRequest};
use terrain_sculptor::script::StrokeScript;
use terrain_sculptor::{
    BrushSize, HeightField, PickTarget, SculptConfig, SurfaceCoord, TerrainGrid, TerrainSession,
};

/// 90 Hz headset
const FRAME_BUDGET: Duration = Duration::from_micros(11_111);

fn main() {
    env_logger::init();

    let config = SculptConfig::default();
    let seed = 1337u64;
    let applications = 100_000usize;

    println!("=== Brush Profiling ===");
    println!("Grid: {}x{} ({} vertices)", config.resolution, config.resolution, config.resolution * config.resolution);
    println!();

    let start = Instant::now();
    let field = match HeightField::synthetic(config.resolution, seed) {
        Ok(field) => field,
        Err(e) => {
            eprintln!("Failed to build height field: {}", e);
            std::process::exit(1);
        }
    };
    println!("Height field generation: {:?}", start.elapsed());

    let start = Instant::now();
    let base = match TerrainGrid::initialize(&field, config.height_scale, &config.prop_layout()) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Failed to initialize terrain: {}", e);
            std::process::exit(1);
        }
    };
    println!("Terrain initialization: {:?}", start.elapsed());
    println!();

    let script = StrokeScript::random(applications / 2, 0.011, seed);
    let coords: Vec<SurfaceCoord> = script
        .frames
        .iter()
        .flat_map(|f| f.events.iter())
        .filter_map(|e| match e.target {
            PickTarget::Terrain(c) => Some(c),
            _ => None,
        })
        .collect();

    for &size in BrushSize::all() {
        let mut grid = base.clone();
        let start = Instant::now();
        for &coord in &coords {
            let request = BrushRequest { coord, strength: 0.1, size, dt: 0.011 };
            brush::apply(&mut grid, &request);
        }
        let elapsed = start.elapsed();
        let per_call = elapsed / coords.len().max(1) as u32;
        println!(
            "Brush {:<6} {:>8} calls in {:?} ({:?} per call, {:.4}% of frame)",
            size.to_string(),
            coords.len(),
            elapsed,
            per_call,
            100.0 * per_call.as_secs_f64() / FRAME_BUDGET.as_secs_f64()
        );
    }

    println!();
    let mut session = match TerrainSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };
    session.load_field(field);
    let start = Instant::now();
    let summary = script.replay(&mut session);
    let elapsed = start.elapsed();
    println!(
        "Session replay: {} frames in {:?} ({:?} per frame)",
        summary.frames,
        elapsed,
        elapsed / summary.frames.max(1) as u32
    );
}
