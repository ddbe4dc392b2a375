use crate::detection::domain::candidate_claims::CandidateClaims;
use crate::detection::domain::gaze_estimator::{Eye, GazeEstimator};
use crate::detection::domain::landmark_model::{FrameImages, LandmarkModel, LandmarkRequest};
use crate::detection::domain::region_proposer::CandidateRegion;
use crate::shared::camera::CameraIntrinsics;
use crate::shared::face_observation::{face_id_for_slot, FaceObservation, NEUTRAL_GAZE};
use crate::shared::rect::Rect;

/// What a slot did during one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Inactive, and no candidate was left to claim.
    Idle,
    /// Exceeded the failure limit and was reset.
    Deactivated,
    /// Claimed candidate `candidate` and ran a seeded localisation.
    Claimed { candidate: usize, success: bool },
    /// Incremental tracking from the previous fit.
    Tracked { success: bool },
}

/// Read-only inputs shared by every slot during one cycle.
#[derive(Clone, Copy)]
pub struct SlotContext<'a> {
    pub images: FrameImages<'a>,
    pub candidates: &'a [CandidateRegion],
    pub claims: &'a CandidateClaims,
    pub camera: &'a CameraIntrinsics,
    pub max_failures: u32,
}

/// One tracker instance in the pool.
///
/// Owns its landmark model exclusively. The slot is created once at pool
/// setup and is reset, never destroyed, when it loses its face.
pub struct ModelSlot {
    index: usize,
    model: Box<dyn LandmarkModel>,
    active: bool,
    consecutive_failures: u32,
    last_success: bool,
    bounding_box: Rect,
}

impl ModelSlot {
    pub fn new(index: usize, model: Box<dyn LandmarkModel>) -> Self {
        Self {
            index,
            model,
            active: false,
            consecutive_failures: 0,
            last_success: false,
            bounding_box: Rect::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether the most recent localisation succeeded.
    pub fn last_success(&self) -> bool {
        self.last_success
    }

    /// Last known box of the tracked face.
    pub fn bounding_box(&self) -> Rect {
        self.bounding_box
    }

    /// Marks the slot inactive and returns its model to a neutral state.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.consecutive_failures = 0;
        self.last_success = false;
        self.bounding_box = Rect::default();
        self.model.reset();
    }

    /// Runs this slot's part of a cycle.
    ///
    /// A slot past the failure limit is deactivated and does nothing else
    /// this cycle. An inactive slot tries to claim a candidate and, on
    /// success, reinitialises from it. An active slot tracks incrementally.
    pub fn update(&mut self, ctx: &SlotContext<'_>) -> SlotOutcome {
        if self.consecutive_failures > ctx.max_failures {
            log::debug!(
                "Slot {} lost its face after {} consecutive failures",
                self.index,
                self.consecutive_failures
            );
            self.deactivate();
            return SlotOutcome::Deactivated;
        }

        if !self.active {
            let Some(candidate) = ctx.claims.claim_first_available() else {
                return SlotOutcome::Idle;
            };
            self.model.reset();
            self.consecutive_failures = 0;
            let request = LandmarkRequest::Seeded {
                region: &ctx.candidates[candidate].rect,
                wide_window: true,
            };
            let success = self.localise(ctx, request);
            self.active = true;
            return SlotOutcome::Claimed { candidate, success };
        }

        let success = self.localise(ctx, LandmarkRequest::Incremental);
        SlotOutcome::Tracked { success }
    }

    fn localise(&mut self, ctx: &SlotContext<'_>, request: LandmarkRequest<'_>) -> bool {
        let success = match self.model.detect(&ctx.images, request, ctx.camera) {
            Ok(success) => success,
            Err(e) => {
                log::debug!("Slot {} landmark detection failed: {e}", self.index);
                false
            }
        };
        if success {
            self.consecutive_failures = 0;
        } else {
            self.consecutive_failures += 1;
        }
        self.last_success = success;
        self.bounding_box = self.model.bounding_box();
        success
    }

    /// Builds this cycle's observation from the model's current state.
    ///
    /// Gaze is estimated for every active slot whether or not this cycle's
    /// localisation succeeded; without an estimator it stays neutral.
    pub fn observe(
        &self,
        camera: &CameraIntrinsics,
        gaze: Option<&dyn GazeEstimator>,
    ) -> FaceObservation {
        if !self.active {
            return FaceObservation::empty(self.index);
        }
        let fit = self.model.fit(camera);
        let (gaze_left, gaze_right) = match gaze {
            Some(estimator) => (
                estimator.estimate(&fit, Eye::Left, camera),
                estimator.estimate(&fit, Eye::Right, camera),
            ),
            None => (NEUTRAL_GAZE, NEUTRAL_GAZE),
        };
        FaceObservation {
            slot: self.index,
            face_id: face_id_for_slot(self.index),
            detected: self.last_success,
            certainty: fit.certainty,
            bounding_box: fit.bounding_box,
            pose: fit.pose,
            landmarks: fit.landmarks,
            eye_landmarks_2d: fit.eye_landmarks_2d,
            eye_landmarks_3d: fit.eye_landmarks_3d,
            gaze_left,
            gaze_right,
        }
    }
}
