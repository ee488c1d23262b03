//! Error types for terrain initialization and configuration.
//!
//! Brush application itself has no error path: an out-of-range neighbor is
//! skipped, not reported. Everything here happens before the terrain is ready.

/// Errors that can occur while building or configuring the terrain
#[derive(Debug)]
pub enum SculptError {
    /// The source image could not be decoded
    Image(image::ImageError),
    /// The source image is not square
    NotSquare { width: u32, height: u32 },
    /// The source image has no pixels
    EmptyImage,
    /// A grid side length of zero was requested
    InvalidResolution(usize),
    /// A raw sample buffer does not hold `resolution²` values
    SampleCount { expected: usize, actual: usize },
    /// A raw sample lies outside `[0, 1]`
    SampleOutOfRange { index: usize, value: f32 },
    /// A configuration value violates a setup-time invariant
    InvalidConfig(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The background loader went away without delivering a result
    LoaderDisconnected,
}

impl std::fmt::Display for SculptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SculptError::Image(e) => write!(f, "Image error: {}", e),
            SculptError::NotSquare { width, height } => {
                write!(f, "Heightmap must be square, got {}x{}", width, height)
            }
            SculptError::EmptyImage => write!(f, "Heightmap image has no pixels"),
            SculptError::InvalidResolution(r) => write!(f, "Invalid grid resolution: {}", r),
            SculptError::SampleCount { expected, actual } => {
                write!(f, "Expected {} height samples, got {}", expected, actual)
            }
            SculptError::SampleOutOfRange { index, value } => {
                write!(f, "Height sample {} is {}, expected a value in [0, 1]", index, value)
            }
            SculptError::InvalidConfig(e) => write!(f, "Invalid config: {}", e),
            SculptError::Io(e) => write!(f, "IO error: {}", e),
            SculptError::Json(e) => write!(f, "Parse error: {}", e),
            SculptError::LoaderDisconnected => write!(f, "Heightmap loader exited without a result"),
        }
    }
}

impl std::error::Error for SculptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SculptError::Image(e) => Some(e),
            SculptError::Io(e) => Some(e),
            SculptError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for SculptError {
    fn from(e: image::ImageError) -> Self {
        SculptError::Image(e)
    }
}

impl From<std::io::Error> for SculptError {
    fn from(e: std::io::Error) -> Self {
        SculptError::Io(e)
    }
}

impl From<serde_json::Error> for SculptError {
    fn from(e: serde_json::Error) -> Self {
        SculptError::Json(e)
    }
}

pub type Result<T> = std::result::Result<T, SculptError>;
