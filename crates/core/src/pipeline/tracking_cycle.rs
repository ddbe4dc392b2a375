use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::gaze_estimator::GazeEstimator;
use crate::detection::domain::landmark_model::{FrameImages, LandmarkModel, ModelFactory};
use crate::detection::domain::model_pool::{ModelPool, PoolReport};
use crate::detection::domain::region_proposer::RegionProposer;
use crate::detection::infrastructure::scripted_backend::{
    FaceTrace, ScriptedGaze, ScriptedLandmarkModel, ScriptedProposer,
};
use crate::pipeline::tracking_config::{ConfigError, TrackingConfig};
use crate::shared::face_observation::FaceObservation;
use crate::shared::frame::Frame;
use crate::tracking::domain::identity_tracker::IdentityTracker;
use crate::tracking::domain::tracked_face::TrackedFace;

/// External capabilities the tracker drives.
pub struct TrackingBackends {
    pub proposer: Box<dyn RegionProposer>,
    /// Without an eye model gaze stays neutral.
    pub gaze: Option<Box<dyn GazeEstimator>>,
    /// Called once per slot at setup.
    pub model_factory: ModelFactory,
}

impl TrackingBackends {
    /// Backends that replay a recorded trace, with gaze.
    pub fn scripted(trace: Arc<FaceTrace>) -> Self {
        let model_trace = Arc::clone(&trace);
        Self {
            proposer: Box::new(ScriptedProposer::new(trace)),
            gaze: Some(Box::new(ScriptedGaze)),
            model_factory: Box::new(move |_kind| {
                Box::new(ScriptedLandmarkModel::new(Arc::clone(&model_trace))) as Box<dyn LandmarkModel>
            }),
        }
    }
}

/// Everything one processed frame produced.
#[derive(Clone, Debug)]
pub struct CycleOutput {
    pub frame_index: usize,
    pub observations: Vec<FaceObservation>,
    pub tracked: Vec<TrackedFace>,
    pub report: PoolReport,
    pub identity_ms: f64,
}

/// One synchronous detect, track and identify pass per frame.
///
/// Owns the model pool and the identity tracker; the threaded service
/// and the replay CLI both drive it.
pub struct TrackingCycle {
    pool: ModelPool,
    identity: IdentityTracker,
    config: TrackingConfig,
}

impl TrackingCycle {
    pub fn new(config: &TrackingConfig, backends: TrackingBackends) -> Result<Self, ConfigError> {
        config.validate()?;
        let TrackingBackends {
            proposer,
            gaze,
            mut model_factory,
        } = backends;
        let landmark_detector = config.landmark_detector;
        let pool = ModelPool::new(
            config.pool_settings(),
            config.slot_count(),
            proposer,
            gaze,
            || model_factory(landmark_detector),
        );
        log::info!(
            "Tracking {} with {} slot(s), {} proposer, {} landmarks, persistence {}ms",
            if config.track_multiple_faces { "multiple faces" } else { "a single face" },
            pool.len(),
            config.detector,
            landmark_detector,
            config.persistence_ms
        );
        Ok(Self {
            pool,
            identity: IdentityTracker::new(config.identity_settings()),
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn pool(&self) -> &ModelPool {
        &self.pool
    }

    pub fn identity(&self) -> &IdentityTracker {
        &self.identity
    }

    /// Processes `frame` as seen at `now`.
    pub fn run(&mut self, frame: &Frame, now: Instant) -> CycleOutput {
        if frame.width() != self.config.image_width || frame.height() != self.config.image_height {
            log::debug!(
                "Frame #{} is {}x{}, configured for {}x{}",
                frame.index(),
                frame.width(),
                frame.height(),
                self.config.image_width,
                self.config.image_height
            );
        }

        let gray = frame.to_grayscale();
        let images = FrameImages {
            color: frame,
            gray: &gray,
        };
        let observations = self.pool.process(&images);

        let identity_start = Instant::now();
        let tracked = self.identity.update(&observations, now);
        let identity_ms = identity_start.elapsed().as_secs_f64() * 1000.0;

        CycleOutput {
            frame_index: frame.index(),
            observations,
            tracked,
            report: self.pool.last_report().clone(),
            identity_ms,
        }
    }

    /// Deactivates every slot. Tracked identities are left to expire.
    pub fn reset_models(&mut self) {
        log::info!("Resetting all landmark models");
        self.pool.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detector_kind::{DetectorKind, LandmarkDetectorKind};
    use crate::detection::domain::landmark_model::{LandmarkFit, LandmarkRequest};
    use crate::detection::domain::region_proposer::{CandidateRegion, CapabilityError};
    use crate::shared::camera::CameraIntrinsics;
    use crate::shared::rect::Rect;
    use std::sync::Mutex;
    use std::time::Duration;

    struct OneFace;

    impl RegionProposer for OneFace {
        fn propose(
            &mut self,
            _image: &Frame,
            _kind: DetectorKind,
        ) -> Result<Vec<CandidateRegion>, CapabilityError> {
            Ok(vec![CandidateRegion::new(Rect::new(100.0, 100.0, 50.0, 50.0), 0.9)])
        }
    }

    /// Locks onto the seed and keeps succeeding.
    #[derive(Default)]
    struct StickyModel {
        rect: Option<Rect>,
    }

    impl LandmarkModel for StickyModel {
        fn detect(
            &mut self,
            _images: &FrameImages<'_>,
            request: LandmarkRequest<'_>,
            _camera: &CameraIntrinsics,
        ) -> Result<bool, CapabilityError> {
            if let LandmarkRequest::Seeded { region, .. } = request {
                self.rect = Some(*region);
            }
            Ok(self.rect.is_some())
        }

        fn reset(&mut self) {
            self.rect = None;
        }

        fn bounding_box(&self) -> Rect {
            self.rect.unwrap_or_default()
        }

        fn fit(&self, _camera: &CameraIntrinsics) -> LandmarkFit {
            LandmarkFit {
                certainty: 0.9,
                bounding_box: self.bounding_box(),
                ..Default::default()
            }
        }
    }

    fn backends() -> TrackingBackends {
        TrackingBackends {
            proposer: Box::new(OneFace),
            gaze: None,
            model_factory: Box::new(|_| Box::new(StickyModel::default()) as Box<dyn LandmarkModel>),
        }
    }

    fn config() -> TrackingConfig {
        TrackingConfig {
            max_faces: 2,
            image_width: 320,
            image_height: 240,
            parallel_slots: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = TrackingConfig {
            max_faces: 0,
            ..Default::default()
        };
        assert!(TrackingCycle::new(&bad, backends()).is_err());
    }

    #[test]
    fn test_one_observation_per_slot() {
        let mut cycle = TrackingCycle::new(&config(), backends()).unwrap();
        let out = cycle.run(&Frame::blank(320, 240, 0), Instant::now());
        assert_eq!(out.observations.len(), 2);
        assert!(out.observations[0].detected);
        assert!(!out.observations[1].detected);
        assert_eq!(out.tracked.len(), 1);
        assert_eq!(out.tracked[0].label, 0);
        assert!(out.report.proposed);
    }

    #[test]
    fn test_frame_index_is_carried() {
        let mut cycle = TrackingCycle::new(&config(), backends()).unwrap();
        let out = cycle.run(&Frame::blank(320, 240, 42), Instant::now());
        assert_eq!(out.frame_index, 42);
    }

    #[test]
    fn test_reset_models_frees_slots_but_keeps_identity() {
        let t0 = Instant::now();
        let mut cycle = TrackingCycle::new(&config(), backends()).unwrap();
        cycle.run(&Frame::blank(320, 240, 0), t0);
        assert_eq!(cycle.pool().active_count(), 1);

        cycle.reset_models();
        assert_eq!(cycle.pool().active_count(), 0);
        assert_eq!(cycle.identity().all().len(), 1);

        // frame 1 is off-cadence: nothing re-proposed, identity still alive
        let out = cycle.run(&Frame::blank(320, 240, 1), t0 + Duration::from_millis(33));
        assert!(out.observations.iter().all(|o| !o.detected));
        assert_eq!(out.tracked.len(), 1);
    }

    #[test]
    fn test_single_face_mode_has_one_slot() {
        let single = TrackingConfig {
            track_multiple_faces: false,
            ..config()
        };
        let mut cycle = TrackingCycle::new(&single, backends()).unwrap();
        let out = cycle.run(&Frame::blank(320, 240, 0), Instant::now());
        assert_eq!(out.observations.len(), 1);
    }

    #[test]
    fn test_every_slot_is_built_with_the_configured_landmark_detector() {
        let built = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&built);
        let backends = TrackingBackends {
            proposer: Box::new(OneFace),
            gaze: None,
            model_factory: Box::new(move |kind| {
                seen.lock().unwrap().push(kind);
                Box::new(StickyModel::default()) as Box<dyn LandmarkModel>
            }),
        };
        let config = TrackingConfig {
            landmark_detector: LandmarkDetectorKind::Clnf,
            ..config()
        };
        TrackingCycle::new(&config, backends).unwrap();
        assert_eq!(*built.lock().unwrap(), vec![LandmarkDetectorKind::Clnf; 2]);
    }
}
