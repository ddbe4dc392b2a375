use super::geometry::{Point2, Point3, Pose};
use super::rect::Rect;

/// Gaze reported when no eye model is available.
pub const NEUTRAL_GAZE: Point3 = Point3::new(0.0, 0.0, -1.0);

/// One slot's result for one processed frame.
///
/// Produced fresh every cycle and handed to consumers by value. When
/// `detected` is false only `detected` and `certainty` are meaningful;
/// the geometry may be stale or default.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    pub slot: usize,
    /// 1-based slot number as text. Local to the slot, not an identity.
    pub face_id: String,
    pub detected: bool,
    pub certainty: f64,
    pub bounding_box: Rect,
    pub pose: Pose,
    pub landmarks: Vec<Point2>,
    pub eye_landmarks_2d: Vec<Point2>,
    pub eye_landmarks_3d: Vec<Point3>,
    pub gaze_left: Point3,
    pub gaze_right: Point3,
}

impl FaceObservation {
    /// Observation for a slot with nothing to report.
    pub fn empty(slot: usize) -> Self {
        Self {
            slot,
            face_id: face_id_for_slot(slot),
            detected: false,
            certainty: 0.0,
            bounding_box: Rect::default(),
            pose: Pose::default(),
            landmarks: Vec::new(),
            eye_landmarks_2d: Vec::new(),
            eye_landmarks_3d: Vec::new(),
            gaze_left: NEUTRAL_GAZE,
            gaze_right: NEUTRAL_GAZE,
        }
    }

    /// Combined gaze as `(yaw, pitch)` in radians from the mean of both
    /// eye directions. Zero when looking straight into the camera.
    pub fn gaze_angle(&self) -> (f64, f64) {
        let mean = (self.gaze_left + self.gaze_right) / 2.0;
        (mean.x.atan2(-mean.z), mean.y.atan2(-mean.z))
    }
}

pub fn face_id_for_slot(slot: usize) -> String {
    (slot + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_observation_is_not_detected() {
        let obs = FaceObservation::empty(2);
        assert!(!obs.detected);
        assert_eq!(obs.slot, 2);
        assert_eq!(obs.certainty, 0.0);
        assert!(obs.landmarks.is_empty());
    }

    #[test]
    fn test_face_id_is_one_based() {
        assert_eq!(FaceObservation::empty(0).face_id, "1");
        assert_eq!(FaceObservation::empty(3).face_id, "4");
    }

    #[test]
    fn test_neutral_gaze_angle_is_zero() {
        let (yaw, pitch) = FaceObservation::empty(0).gaze_angle();
        assert_relative_eq!(yaw, 0.0);
        assert_relative_eq!(pitch, 0.0);
    }

    #[test]
    fn test_gaze_angle_to_the_side() {
        let mut obs = FaceObservation::empty(0);
        obs.gaze_left = Point3::new(1.0, 0.0, -1.0);
        obs.gaze_right = Point3::new(1.0, 0.0, -1.0);
        let (yaw, pitch) = obs.gaze_angle();
        assert_relative_eq!(yaw, std::f64::consts::FRAC_PI_4);
        assert_relative_eq!(pitch, 0.0);
    }
}
