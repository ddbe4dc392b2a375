use crate::shared::face_observation::FaceObservation;
use crate::tracking::domain::tracked_face::TrackedFace;

/// Results published by the worker, one of each per processed frame,
/// observations first.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackingEvent {
    /// One observation per slot, in slot order.
    Observations {
        frame_index: usize,
        observations: Vec<FaceObservation>,
    },
    /// Faces with stable labels.
    Tracked {
        frame_index: usize,
        tracked: Vec<TrackedFace>,
    },
}

impl TrackingEvent {
    pub fn frame_index(&self) -> usize {
        match self {
            TrackingEvent::Observations { frame_index, .. }
            | TrackingEvent::Tracked { frame_index, .. } => *frame_index,
        }
    }
}
