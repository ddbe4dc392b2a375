use crate::detection::domain::landmark_model::LandmarkFit;
use crate::shared::camera::CameraIntrinsics;
use crate::shared::geometry::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Domain interface for per-eye gaze estimation (needs an eye model).
///
/// Shared by all slots, hence `Sync`.
pub trait GazeEstimator: Send + Sync {
    /// Gaze direction for one eye in camera coordinates.
    fn estimate(&self, fit: &LandmarkFit, eye: Eye, camera: &CameraIntrinsics) -> Point3;
}
