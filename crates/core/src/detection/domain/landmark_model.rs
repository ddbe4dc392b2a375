use crate::detection::domain::detector_kind::LandmarkDetectorKind;
use crate::detection::domain::region_proposer::CapabilityError;
use crate::shared::camera::CameraIntrinsics;
use crate::shared::frame::Frame;
use crate::shared::geometry::{Point2, Point3, Pose};
use crate::shared::rect::Rect;

/// Colour frame plus its derived grayscale, computed once per cycle.
#[derive(Clone, Copy, Debug)]
pub struct FrameImages<'a> {
    pub color: &'a Frame,
    pub gray: &'a Frame,
}

/// How a landmark model should localise the face this cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LandmarkRequest<'a> {
    /// Cold start from a freshly claimed region. `wide_window` asks for a
    /// wider search window on the initial localisation.
    Seeded { region: &'a Rect, wide_window: bool },
    /// Warm tracking from the model's previous fit.
    Incremental,
}

/// Snapshot of a model's current fit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkFit {
    pub certainty: f64,
    pub bounding_box: Rect,
    pub pose: Pose,
    pub landmarks: Vec<Point2>,
    pub eye_landmarks_2d: Vec<Point2>,
    pub eye_landmarks_3d: Vec<Point3>,
}

/// Domain interface for a per-face landmark regressor.
///
/// Each slot owns one instance exclusively; instances never share state.
pub trait LandmarkModel: Send {
    /// Runs one localisation pass. `Ok(false)` is an ordinary miss.
    fn detect(
        &mut self,
        images: &FrameImages<'_>,
        request: LandmarkRequest<'_>,
        camera: &CameraIntrinsics,
    ) -> Result<bool, CapabilityError>;

    /// Returns the regressor to its uninitialised state.
    fn reset(&mut self);

    fn bounding_box(&self) -> Rect;

    fn fit(&self, camera: &CameraIntrinsics) -> LandmarkFit;
}

/// Builds one independent model per slot for the configured regressor.
pub type ModelFactory = Box<dyn FnMut(LandmarkDetectorKind) -> Box<dyn LandmarkModel> + Send>;
