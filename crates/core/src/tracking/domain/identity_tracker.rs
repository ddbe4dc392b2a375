use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::shared::constants::{
    DEFAULT_CERTAINTY_THRESHOLD, DEFAULT_DISAPPEARANCE_GRACE_MS, DEFAULT_MAX_DISTANCE_PX,
    DEFAULT_PERSISTENCE_MS,
};
use crate::shared::face_observation::FaceObservation;

use super::nearest_neighbor::match_nearest;
use super::tracked_face::TrackedFace;

#[derive(Clone, Debug, PartialEq)]
pub struct IdentitySettings {
    pub persistence: Duration,
    pub max_distance_px: f64,
    pub certainty_threshold: f64,
    pub disappearance_grace: Duration,
    pub single_face: bool,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            persistence: Duration::from_millis(DEFAULT_PERSISTENCE_MS),
            max_distance_px: DEFAULT_MAX_DISTANCE_PX,
            certainty_threshold: DEFAULT_CERTAINTY_THRESHOLD,
            disappearance_grace: Duration::from_millis(DEFAULT_DISAPPEARANCE_GRACE_MS),
            single_face: false,
        }
    }
}

/// Turns per-slot observations into faces with stable labels.
///
/// Each update first evicts faces with no good sighting within the
/// persistence window, then matches detected observations to the
/// survivors by nearest neighbour. An unmatched observation becomes a new
/// face with a fresh label only if it meets the certainty threshold, so a
/// face that is never seen confidently never holds an identity. Labels are
/// allocated monotonically and never reused.
pub struct IdentityTracker {
    settings: IdentitySettings,
    faces: Vec<TrackedFace>,
    next_label: Option<u64>,
}

impl IdentityTracker {
    pub fn new(settings: IdentitySettings) -> Self {
        Self {
            settings,
            faces: Vec::new(),
            next_label: Some(0),
        }
    }

    pub fn settings(&self) -> &IdentitySettings {
        &self.settings
    }

    /// Processes one cycle of observations and returns a snapshot of the
    /// faces consumers should see.
    pub fn update(&mut self, observations: &[FaceObservation], now: Instant) -> Vec<TrackedFace> {
        self.evict(now);

        let detected: Vec<&FaceObservation> = observations.iter().filter(|o| o.detected).collect();
        let matches = match_nearest(&self.faces, &detected, self.settings.max_distance_px);

        let mut observation_matched = vec![false; detected.len()];
        for &(face_idx, obs_idx) in &matches {
            observation_matched[obs_idx] = true;
            self.faces[face_idx].update(
                detected[obs_idx].clone(),
                now,
                self.settings.certainty_threshold,
                self.settings.disappearance_grace,
            );
        }

        for (obs_idx, matched) in observation_matched.into_iter().enumerate() {
            let observation = detected[obs_idx];
            if matched {
                continue;
            }
            if observation.certainty < self.settings.certainty_threshold {
                debug!(
                    "Slot {} face at certainty {:.2} too weak for a new label",
                    observation.slot, observation.certainty
                );
                continue;
            }
            let Some(label) = self.allocate_label() else {
                error!("Face labels exhausted, slot {} stays unlabelled", observation.slot);
                continue;
            };
            info!("New face label {} from slot {}", label, observation.slot);
            self.faces.push(TrackedFace::setup(observation.clone(), label, now));
        }

        self.tracked().to_vec()
    }

    /// Current live faces. In single-face mode at most the oldest one.
    pub fn tracked(&self) -> &[TrackedFace] {
        if self.settings.single_face {
            &self.faces[..self.faces.len().min(1)]
        } else {
            &self.faces
        }
    }

    /// Every live face regardless of single-face mode.
    pub fn all(&self) -> &[TrackedFace] {
        &self.faces
    }

    pub fn len(&self) -> usize {
        self.tracked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked().is_empty()
    }

    /// Label the next new face will receive; `None` once every label has
    /// been handed out.
    pub fn next_label(&self) -> Option<u64> {
        self.next_label
    }

    fn allocate_label(&mut self) -> Option<u64> {
        let label = self.next_label?;
        self.next_label = label.checked_add(1);
        Some(label)
    }

    fn evict(&mut self, now: Instant) {
        let persistence = self.settings.persistence;
        for face in &mut self.faces {
            if face.is_expired(now, persistence) {
                face.kill();
                info!("Face label {} expired", face.label);
            }
        }
        self.faces.retain(|f| !f.dead);
    }
}
