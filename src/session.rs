//! Frame-driven sculpting session.
//!
//! The session owns the terrain for the lifetime of the scene. It stays in
//! `Loading` until a height field arrives; every frame before that, and
//! every frame after a failed load, is a no-op.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use image::DynamicImage;

use crate::brush::{self, BrushReport, BrushRequest};
use crate::config::SculptConfig;
use crate::error::{Result, SculptError};
use crate::heightfield::HeightField;
use crate::pick::{ControllerId, DecorationHandle, PickEvent, PickTarget};
use crate::terrain::{ChangeSet, TerrainGrid};

/// Readiness of the terrain
#[derive(Debug)]
pub enum TerrainState {
    Loading,
    Ready(TerrainGrid),
    Failed(SculptError),
}

/// Vertical move the host should apply to a decorative object
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecorationMove {
    pub controller: ControllerId,
    pub handle: DecorationHandle,
    pub dy: f32,
}

/// Everything one call to [`TerrainSession::update`] did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// False when the terrain was not ready and nothing was applied
    pub applied: bool,
    pub brushes: Vec<(ControllerId, BrushReport)>,
    pub decoration_moves: Vec<DecorationMove>,
    pub ignored: usize,
    /// Extra events from a controller that already had one this frame
    pub dropped: usize,
}

pub struct TerrainSession {
    config: SculptConfig,
    state: TerrainState,
    pending: Option<Receiver<Result<HeightField>>>,
    warned_not_ready: bool,
}

impl TerrainSession {
    pub fn new(config: SculptConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: TerrainState::Loading,
            pending: None,
            warned_not_ready: false,
        })
    }

    pub fn config(&self) -> &SculptConfig {
        &self.config
    }

    pub fn state(&self) -> &TerrainState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, TerrainState::Ready(_))
    }

    pub fn failure(&self) -> Option<&SculptError> {
        match &self.state {
            TerrainState::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn grid(&self) -> Option<&TerrainGrid> {
        match &self.state {
            TerrainState::Ready(grid) => Some(grid),
            _ => None,
        }
    }

    /// Drain pending render changes, if the terrain is ready.
    pub fn take_changes(&mut self) -> Option<ChangeSet> {
        match &mut self.state {
            TerrainState::Ready(grid) => Some(grid.take_changes()),
            _ => None,
        }
    }

    /// Build the terrain from an already decoded image. Returns readiness.
    pub fn load_image(&mut self, image: &DynamicImage) -> bool {
        let result = HeightField::build(image, self.config.resolution, self.config.sample_params());
        self.finish_loading(result)
    }

    /// Build the terrain from an existing height field. Returns readiness.
    pub fn load_field(&mut self, field: HeightField) -> bool {
        self.finish_loading(Ok(field))
    }

    /// Decode `path` on a worker thread. The session stays `Loading` until
    /// [`Self::poll_loading`] (called by every [`Self::update`]) picks up
    /// the result.
    pub fn load_in_background<P: Into<PathBuf>>(&mut self, path: P) {
        let path = path.into();
        let resolution = self.config.resolution;
        let params = self.config.sample_params();
        let (tx, rx) = mpsc::channel();

        rayon::spawn(move || {
            let result = HeightField::open(&path, resolution, params);
            // The session may already be gone
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        self.set_state(TerrainState::Loading);
    }

    /// Check for a finished background load. Returns readiness.
    pub fn poll_loading(&mut self) -> bool {
        let received = match &self.pending {
            Some(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(SculptError::LoaderDisconnected)),
            },
            None => None,
        };

        match received {
            Some(result) => {
                self.pending = None;
                self.finish_loading(result)
            }
            None => self.is_ready(),
        }
    }

    /// Block until a background load finishes. Returns readiness.
    pub fn wait_for_loading(&mut self) -> bool {
        let result = match self.pending.take() {
            Some(rx) => rx.recv().unwrap_or(Err(SculptError::LoaderDisconnected)),
            None => return self.is_ready(),
        };
        self.finish_loading(result)
    }

    fn finish_loading(&mut self, result: Result<HeightField>) -> bool {
        let layout = self.config.prop_layout();
        let height_scale = self.config.height_scale;

        match result.and_then(|field| TerrainGrid::initialize(&field, height_scale, &layout)) {
            Ok(grid) => {
                log::info!(
                    "Terrain ready: {}x{} vertices, {} props ({} visible)",
                    grid.size(),
                    grid.size(),
                    grid.props().len(),
                    grid.props().visible_count()
                );
                self.set_state(TerrainState::Ready(grid));
                true
            }
            Err(e) => {
                log::error!("Terrain initialization failed: {}", e);
                self.set_state(TerrainState::Failed(e));
                false
            }
        }
    }

    fn set_state(&mut self, state: TerrainState) {
        self.state = state;
        self.warned_not_ready = false;
    }

    /// Apply one frame of pick events.
    ///
    /// Events are applied primary controller first, then secondary, one per
    /// controller; later events from the same controller are dropped. Order
    /// matters for prop visibility when both brushes land on the same blade.
    pub fn update(&mut self, dt: f32, events: &[PickEvent]) -> FrameReport {
        self.poll_loading();

        let mut report = FrameReport::default();
        let grid = match &mut self.state {
            TerrainState::Ready(grid) => grid,
            _ => {
                if !events.is_empty() && !self.warned_not_ready {
                    log::warn!("Terrain not ready, ignoring {} pick event(s)", events.len());
                    self.warned_not_ready = true;
                }
                return report;
            }
        };
        report.applied = true;

        let mut ordered: Vec<&PickEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.controller);

        let mut seen: Vec<ControllerId> = Vec::with_capacity(2);
        for event in ordered {
            if seen.contains(&event.controller) {
                log::warn!("Dropping extra pick event from {} controller", event.controller);
                report.dropped += 1;
                continue;
            }
            seen.push(event.controller);

            let binding = self.config.binding(event.controller);
            match event.target {
                PickTarget::Terrain(coord) => {
                    let request = BrushRequest {
                        coord,
                        strength: binding.strength,
                        size: binding.brush_size,
                        dt,
                    };
                    let brush_report = brush::apply(grid, &request);
                    report.brushes.push((event.controller, brush_report));
                }
                PickTarget::Decoration(handle) => {
                    report.decoration_moves.push(DecorationMove {
                        controller: event.controller,
                        handle,
                        dy: dt * binding.strength,
                    });
                }
                PickTarget::Ignored => report.ignored += 1,
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::BrushSize;
    use image::{GrayImage, ImageBuffer};

    fn small_config() -> SculptConfig {
        SculptConfig {
            resolution: 8,
            height_scale: 1.0,
            prop_stride: 4,
            ..Default::default()
        }
    }

    fn ready_session(config: SculptConfig) -> TerrainSession {
        let n = config.resolution;
        let mut session = TerrainSession::new(config).unwrap();
        assert!(session.load_field(HeightField::from_samples(n, vec![0.0; n * n]).unwrap()));
        session
    }

    #[test]
    fn test_not_ready_is_noop() {
        let mut session = TerrainSession::new(small_config()).unwrap();
        assert!(!session.is_ready());
        let report = session.update(0.1, &[PickEvent::terrain(ControllerId::Primary, 0.5, 0.5)]);
        assert!(!report.applied);
        assert!(report.brushes.is_empty());
        assert!(session.take_changes().is_none());
    }

    #[test]
    fn test_failed_load_stays_not_ready() {
        let mut session = TerrainSession::new(small_config()).unwrap();
        let img: GrayImage = ImageBuffer::new(8, 4);
        assert!(!session.load_image(&DynamicImage::ImageLuma8(img)));
        assert!(matches!(session.failure(), Some(SculptError::NotSquare { .. })));

        let report = session.update(0.1, &[PickEvent::terrain(ControllerId::Primary, 0.5, 0.5)]);
        assert!(!report.applied);

        // An explicit reload recovers
        let img: GrayImage = ImageBuffer::new(8, 8);
        assert!(session.load_image(&DynamicImage::ImageLuma8(img)));
        assert!(session.failure().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SculptConfig { prop_stride: 3, ..small_config() };
        assert!(TerrainSession::new(config).is_err());
    }

    #[test]
    fn test_controllers_apply_in_order() {
        let mut config = small_config();
        config.controllers.primary.brush_size = BrushSize::Small;
        config.controllers.secondary.brush_size = BrushSize::Small;
        let mut session = ready_session(config);

        // Secondary listed first, primary must still go first
        let events = [
            PickEvent::terrain(ControllerId::Secondary, 0.5, 0.5),
            PickEvent::terrain(ControllerId::Primary, 0.5, 0.5),
        ];
        let report = session.update(1.0, &events);
        assert!(report.applied);
        let order: Vec<_> = report.brushes.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, vec![ControllerId::Primary, ControllerId::Secondary]);

        // +0.1 then -0.1 on the same vertex
        let center = report.brushes[0].1.center.unwrap();
        let h = session.grid().unwrap().height_at(center).unwrap();
        assert!(h.abs() < 1e-6);
    }

    #[test]
    fn test_extra_events_are_dropped() {
        let mut session = ready_session(small_config());
        let events = [
            PickEvent::terrain(ControllerId::Primary, 0.5, 0.5),
            PickEvent::terrain(ControllerId::Primary, 0.1, 0.1),
        ];
        let report = session.update(0.5, &events);
        assert_eq!(report.brushes.len(), 1);
        assert_eq!(report.dropped, 1);
    }

    #[test]
    fn test_decoration_and_ignored_targets() {
        let mut session = ready_session(small_config());
        let events = [
            PickEvent::decoration(ControllerId::Primary, 7),
            PickEvent::ignored(ControllerId::Secondary),
        ];
        let report = session.update(0.5, &events);
        assert!(report.brushes.is_empty());
        assert_eq!(report.ignored, 1);
        assert_eq!(
            report.decoration_moves,
            vec![DecorationMove {
                controller: ControllerId::Primary,
                handle: DecorationHandle(7),
                dy: 0.05,
            }]
        );
        // Decoration hits leave the terrain alone
        assert!(!session.grid().unwrap().has_changes());
    }

    #[test]
    fn test_changes_are_drained() {
        let mut session = ready_session(small_config());
        session.update(0.5, &[PickEvent::terrain(ControllerId::Primary, 0.5, 0.5)]);
        let changes = session.take_changes().unwrap();
        assert!(changes.heights_dirty);
        assert_eq!(changes.touched_props.len(), 1);
        assert!(session.take_changes().unwrap().is_empty());
    }

    #[test]
    fn test_background_load_missing_file_fails() {
        let mut session = TerrainSession::new(small_config()).unwrap();
        session.load_in_background("does/not/exist.png");
        assert!(!session.wait_for_loading());
        assert!(matches!(session.failure(), Some(SculptError::Image(_))));
    }

    #[test]
    fn test_background_load_succeeds() {
        let path = std::env::temp_dir().join(format!("sculpt_bg_{}.png", std::process::id()));
        let img: GrayImage = ImageBuffer::from_pixel(8, 8, image::Luma([51u8]));
        img.save(&path).unwrap();

        let mut session = TerrainSession::new(small_config()).unwrap();
        session.load_in_background(&path);
        assert!(session.wait_for_loading());
        let h = session.grid().unwrap().height_at(0).unwrap();
        assert!((h - 0.2).abs() < 1e-6);

        let _ = std::fs::remove_file(&path);
    }
}
