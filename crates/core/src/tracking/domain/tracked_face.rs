use std::time::{Duration, Instant};

use crate::shared::face_observation::FaceObservation;
use crate::shared::rect::Rect;

use super::locatable::Locatable;

/// A face with a stable identity across frames.
///
/// Holds the latest matched observation by value plus the identity
/// bookkeeping. `first_seen` marks the start of the current appearance and
/// may move forward on reappearance while `label` stays fixed.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedFace {
    pub observation: FaceObservation,
    pub label: u64,
    pub first_seen: Instant,
    pub last_seen: Instant,
    pub last_good_seen: Instant,
    pub dead: bool,
}

impl TrackedFace {
    pub fn setup(observation: FaceObservation, label: u64, now: Instant) -> Self {
        Self {
            observation,
            label,
            first_seen: now,
            last_seen: now,
            last_good_seen: now,
            dead: false,
        }
    }

    /// Takes the newly matched observation. Only an observation at or
    /// above `certainty_threshold` advances `last_good_seen`; if the gap
    /// since the previous good sighting exceeds `grace`, the appearance
    /// restarts and `first_seen` moves to `now`.
    pub fn update(
        &mut self,
        observation: FaceObservation,
        now: Instant,
        certainty_threshold: f64,
        grace: Duration,
    ) {
        let qualifies = observation.certainty >= certainty_threshold;
        self.observation = observation;
        self.last_seen = now;
        if qualifies {
            if now.saturating_duration_since(self.last_good_seen) > grace {
                self.first_seen = now;
            }
            self.last_good_seen = now;
        }
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.first_seen)
    }

    pub fn age_seconds(&self, now: Instant) -> u64 {
        self.age(now).as_secs()
    }

    pub fn since_good_seen(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_good_seen)
    }

    pub fn is_expired(&self, now: Instant, persistence: Duration) -> bool {
        self.since_good_seen(now) > persistence
    }
}

impl Locatable for TrackedFace {
    fn bounds(&self) -> Rect {
        self.observation.bounding_box
    }
}
