//! Real-time terrain sculpting core
//!
//! Turns a grayscale heightmap into an editable height grid, applies
//! fixed-footprint raise/lower brushes driven by controller pick events, and
//! keeps the grass props on the terrain in step with the edits.

pub mod brush;
pub mod config;
pub mod error;
pub mod export;
pub mod heightfield;
pub mod indexer;
pub mod pick;
pub mod props;
pub mod script;
pub mod session;
pub mod terrain;
pub mod tilemap;

pub use brush::{BrushReport, BrushRequest};
pub use config::SculptConfig;
pub use error::SculptError;
pub use heightfield::HeightField;
pub use indexer::{BrushSize, SurfaceCoord};
pub use pick::{ControllerId, PickEvent, PickTarget};
pub use session::{FrameReport, TerrainSession, TerrainState};
pub use terrain::TerrainGrid;
