//! Recorded or generated pick streams for driving a session without a headset.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pick::{ControllerId, PickEvent};
use crate::session::TerrainSession;

/// Pick events for one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptFrame {
    pub dt: f32,
    #[serde(default)]
    pub events: Vec<PickEvent>,
}

/// Sequence of frames replayed through [`TerrainSession::update`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeScript {
    pub frames: Vec<ScriptFrame>,
}

/// Totals over a replay
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReplaySummary {
    pub frames: usize,
    /// Frames skipped because the terrain was not ready
    pub skipped_frames: usize,
    pub brush_applications: usize,
    pub vertex_writes: usize,
    pub skipped_passes: usize,
    pub prop_updates: usize,
    pub decoration_moves: usize,
    pub ignored: usize,
}

/// Chance per controller per frame that the ray misses the terrain
const OFF_TERRAIN_CHANCE: f64 = 0.05;
/// Largest UV step between frames of a stroke
const WALK_STEP: f32 = 0.01;

impl StrokeScript {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deterministic random strokes: each controller walks across the
    /// surface in small steps, occasionally hitting a tree or nothing.
    pub fn random(frames: usize, dt: f32, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut cursors: Vec<(f32, f32)> = ControllerId::all()
            .iter()
            .map(|_| (rng.gen_range(0.0..=1.0), rng.gen_range(0.0..=1.0)))
            .collect();

        let frames = (0..frames)
            .map(|_| {
                let events = ControllerId::all()
                    .iter()
                    .zip(cursors.iter_mut())
                    .map(|(&controller, cursor)| {
                        cursor.0 = (cursor.0 + rng.gen_range(-WALK_STEP..=WALK_STEP)).clamp(0.0, 1.0);
                        cursor.1 = (cursor.1 + rng.gen_range(-WALK_STEP..=WALK_STEP)).clamp(0.0, 1.0);

                        if rng.gen_bool(OFF_TERRAIN_CHANCE) {
                            if rng.gen_bool(0.5) {
                                PickEvent::decoration(controller, rng.gen_range(0..4))
                            } else {
                                PickEvent::ignored(controller)
                            }
                        } else {
                            PickEvent::terrain(controller, cursor.0, cursor.1)
                        }
                    })
                    .collect();
                ScriptFrame { dt, events }
            })
            .collect();

        Self { frames }
    }

    /// Run every frame through `session`.
    pub fn replay(&self, session: &mut TerrainSession) -> ReplaySummary {
        let mut summary = ReplaySummary::default();

        for frame in &self.frames {
            let report = session.update(frame.dt, &frame.events);
            summary.frames += 1;
            if !report.applied {
                summary.skipped_frames += 1;
                continue;
            }
            for (_, brush) in &report.brushes {
                summary.brush_applications += 1;
                summary.vertex_writes += brush.writes;
                summary.skipped_passes += brush.skipped;
                if brush.prop.is_some() {
                    summary.prop_updates += 1;
                }
            }
            summary.decoration_moves += report.decoration_moves.len();
            summary.ignored += report.ignored;
        }

        summary
    }
}
