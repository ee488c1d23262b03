use std::path::PathBuf;

use clap::Parser;

use terrain_sculptor::export;
use terrain_sculptor::script::StrokeScript;
use terrain_sculptor::{HeightField, SculptConfig, TerrainSession};

#[derive(Parser, Debug)]
#[command(name = "terrain_sculptor")]
#[command(about = "Replay brush strokes on a heightmap terrain and render a preview")]
struct Args {
    /// Grayscale heightmap image (square)
    #[arg(long)]
    heightmap: Option<PathBuf>,

    /// Use a procedural height field with this seed instead of an image
    #[arg(long)]
    synthetic_seed: Option<u64>,

    /// JSON config file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON stroke script to replay
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Number of random frames to generate when no script is given
    #[arg(long, default_value = "600")]
    random_frames: usize,

    /// Frame time for generated strokes (seconds)
    #[arg(long, default_value = "0.016")]
    dt: f32,

    /// Seed for generated strokes
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Write the generated stroke script to this file
    #[arg(long)]
    save_script: Option<PathBuf>,

    /// Preview image output path
    #[arg(short, long, default_value = "sculpted.png")]
    output: PathBuf,

    /// Apply hillshading to the preview
    #[arg(long)]
    shaded: bool,

    /// Do not draw visible grass props on the preview
    #[arg(long)]
    hide_props: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SculptConfig::load(path)?,
        None => SculptConfig::default(),
    };
    println!(
        "Terrain {}x{}, height scale {}, {}x{} grass grid",
        config.resolution,
        config.resolution,
        config.height_scale,
        config.prop_resolution(),
        config.prop_resolution()
    );

    let mut session = TerrainSession::new(config)?;
    match (&args.heightmap, args.synthetic_seed) {
        (Some(path), _) => {
            println!("Loading heightmap {}...", path.display());
            session.load_in_background(path.clone());
            session.wait_for_loading();
        }
        (None, seed) => {
            let seed = seed.unwrap_or(args.seed);
            println!("Generating synthetic height field (seed {})...", seed);
            let field = HeightField::synthetic(session.config().resolution, seed)?;
            session.load_field(field);
        }
    }

    if let Some(e) = session.failure() {
        eprintln!("Terrain could not be initialized: {}", e);
        std::process::exit(1);
    }

    let script = match &args.script {
        Some(path) => StrokeScript::load(path)?,
        None => StrokeScript::random(args.random_frames, args.dt, args.seed),
    };
    if let Some(path) = &args.save_script {
        std::fs::write(path, script.to_json()?)?;
        println!("Saved stroke script to {}", path.display());
    }

    println!("Replaying {} frames...", script.frames.len());
    let summary = script.replay(&mut session);
    println!("  Brush applications: {}", summary.brush_applications);
    println!("  Vertex writes: {} ({} out-of-grid passes skipped)", summary.vertex_writes, summary.skipped_passes);
    println!("  Grass updates: {}", summary.prop_updates);
    println!("  Decoration moves: {}", summary.decoration_moves);
    println!("  Ignored picks: {}", summary.ignored);

    if let Some(grid) = session.grid() {
        if let Some((min_h, max_h)) = grid.heights().min_max() {
            println!(
                "Height range: {:.3} to {:.3} (scale {})",
                min_h,
                max_h,
                grid.height_scale()
            );
        }
        let band = grid.props().band();
        println!(
            "Visible grass: {}/{} (band {} to {})",
            grid.props().visible_count(),
            grid.props().len(),
            band.min,
            band.max
        );

        export::save_preview(grid, &args.output, args.shaded, !args.hide_props)?;
        println!("Saved preview to {}", args.output.display());
    }

    Ok(())
}
