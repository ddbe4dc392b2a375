use std::time::Instant;

use rayon::prelude::*;

use crate::detection::domain::candidate_claims::CandidateClaims;
use crate::detection::domain::detector_kind::DetectorKind;
use crate::detection::domain::gaze_estimator::GazeEstimator;
use crate::detection::domain::landmark_model::{FrameImages, LandmarkModel};
use crate::detection::domain::model_slot::{ModelSlot, SlotContext, SlotOutcome};
use crate::detection::domain::overlap_filter::non_overlapping;
use crate::detection::domain::region_proposer::{CandidateRegion, RegionProposer};
use crate::shared::camera::CameraIntrinsics;
use crate::shared::constants::{DETECTION_INTERVAL, MAX_CONSECUTIVE_FAILURES, OVERLAP_THRESHOLD};
use crate::shared::face_observation::FaceObservation;
use crate::shared::rect::Rect;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoolSettings {
    pub detector: DetectorKind,
    pub camera: CameraIntrinsics,
    pub detection_interval: u64,
    pub max_consecutive_failures: u32,
    pub overlap_threshold: f64,
    /// Update slots on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl PoolSettings {
    pub fn new(detector: DetectorKind, camera: CameraIntrinsics) -> Self {
        Self {
            detector,
            camera,
            detection_interval: DETECTION_INTERVAL,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            overlap_threshold: OVERLAP_THRESHOLD,
            parallel: true,
        }
    }
}

/// What happened in the pool during one cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolReport {
    pub proposed: bool,
    /// Proposals before the overlap filter.
    pub proposals: usize,
    /// Candidates left after the overlap filter.
    pub candidates: usize,
    pub claimed: usize,
    pub deactivated: usize,
    pub active_slots: usize,
    pub proposal_ms: f64,
    pub landmark_ms: f64,
}

/// Fixed-size pool of landmark models, one per trackable face.
///
/// Each cycle it optionally proposes new regions (every
/// `detection_interval` frames, and only while some slot is free),
/// filters out regions already tracked, lets free slots claim the rest,
/// and updates every slot. Slot `i` always produces observation `i`.
pub struct ModelPool {
    slots: Vec<ModelSlot>,
    proposer: Box<dyn RegionProposer>,
    gaze: Option<Box<dyn GazeEstimator>>,
    settings: PoolSettings,
    frame_count: u64,
    last_report: PoolReport,
}

impl ModelPool {
    /// Builds `slot_count` slots, each with its own model from `make_model`.
    pub fn new(
        settings: PoolSettings,
        slot_count: usize,
        proposer: Box<dyn RegionProposer>,
        gaze: Option<Box<dyn GazeEstimator>>,
        mut make_model: impl FnMut() -> Box<dyn LandmarkModel>,
    ) -> Self {
        let slots = (0..slot_count)
            .map(|i| ModelSlot::new(i, make_model()))
            .collect();
        Self {
            slots,
            proposer,
            gaze,
            settings,
            frame_count: 0,
            last_report: PoolReport::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&ModelSlot> {
        self.slots.get(index)
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Number of cycles processed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    pub fn all_active(&self) -> bool {
        self.slots.iter().all(|s| s.is_active())
    }

    pub fn last_report(&self) -> &PoolReport {
        &self.last_report
    }

    /// Whether the current cycle runs region proposal.
    pub fn should_propose(&self) -> bool {
        self.frame_count % self.settings.detection_interval.max(1) == 0 && !self.all_active()
    }

    /// Deactivates every slot and resets its model.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.deactivate();
        }
    }

    /// Runs one detection/tracking cycle and returns one observation per slot.
    pub fn process(&mut self, images: &FrameImages<'_>) -> Vec<FaceObservation> {
        let mut report = PoolReport::default();

        let proposal_start = Instant::now();
        let candidates = if self.should_propose() {
            report.proposed = true;
            let proposals = self.propose(images);
            report.proposals = proposals.len();
            non_overlapping(&self.active_boxes(), proposals, self.settings.overlap_threshold)
        } else {
            Vec::new()
        };
        report.candidates = candidates.len();
        report.proposal_ms = proposal_start.elapsed().as_secs_f64() * 1000.0;

        let landmark_start = Instant::now();
        let claims = CandidateClaims::new(candidates.len());
        let camera = self.settings.camera;
        let ctx = SlotContext {
            images: *images,
            candidates: &candidates,
            claims: &claims,
            camera: &camera,
            max_failures: self.settings.max_consecutive_failures,
        };
        let outcomes: Vec<SlotOutcome> = if self.settings.parallel {
            self.slots.par_iter_mut().map(|s| s.update(&ctx)).collect()
        } else {
            self.slots.iter_mut().map(|s| s.update(&ctx)).collect()
        };
        report.landmark_ms = landmark_start.elapsed().as_secs_f64() * 1000.0;

        for outcome in &outcomes {
            match outcome {
                SlotOutcome::Claimed { .. } => report.claimed += 1,
                SlotOutcome::Deactivated => report.deactivated += 1,
                _ => {}
            }
        }
        report.active_slots = self.active_count();
        if report.proposed {
            log::debug!(
                "Frame {}: {} proposals, {} after overlap filter, {} claimed",
                self.frame_count,
                report.proposals,
                report.candidates,
                report.claimed
            );
        }

        self.frame_count += 1;
        self.last_report = report;

        let gaze = self.gaze.as_deref();
        self.slots.iter().map(|s| s.observe(&camera, gaze)).collect()
    }

    fn propose(&mut self, images: &FrameImages<'_>) -> Vec<CandidateRegion> {
        let kind = self.settings.detector;
        let image = if kind.uses_grayscale() {
            images.gray
        } else {
            images.color
        };
        match self.proposer.propose(image, kind) {
            Ok(regions) => regions,
            Err(e) => {
                log::warn!("Region proposal failed ({kind}): {e}");
                Vec::new()
            }
        }
    }

    fn active_boxes(&self) -> Vec<Rect> {
        self.slots
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.bounding_box())
            .collect()
    }
}
