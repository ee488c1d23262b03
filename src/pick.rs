//! Pick events delivered by the host once per frame.
//!
//! The host ray-casts each controller against the scene and classifies the
//! hit. Only terrain hits become brush strokes; decoration hits are handed
//! back as a plain vertical move for the host to apply.

use serde::{Deserialize, Serialize};

use crate::indexer::SurfaceCoord;

/// Hand controller that produced an event. Events are applied in the
/// declaration order of this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerId {
    Primary,
    Secondary,
}

impl ControllerId {
    pub fn all() -> &'static [Self] {
        &[Self::Primary, Self::Secondary]
    }
}

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
        }
    }
}

/// Opaque host-side id of a decorative object (a tree, a rock)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecorationHandle(pub u32);

/// What a controller ray hit
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickTarget {
    Terrain(SurfaceCoord),
    Decoration(DecorationHandle),
    Ignored,
}

/// One controller's hit for the current frame, reported while its edit
/// gesture is held
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PickEvent {
    pub controller: ControllerId,
    pub target: PickTarget,
}

impl PickEvent {
    pub fn terrain(controller: ControllerId, u: f32, v: f32) -> Self {
        Self {
            controller,
            target: PickTarget::Terrain(SurfaceCoord::new(u, v)),
        }
    }

    pub fn decoration(controller: ControllerId, handle: u32) -> Self {
        Self {
            controller,
            target: PickTarget::Decoration(DecorationHandle(handle)),
        }
    }

    pub fn ignored(controller: ControllerId) -> Self {
        Self {
            controller,
            target: PickTarget::Ignored,
        }
    }
}
