use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detector_kind::DetectorKind;
use crate::detection::domain::gaze_estimator::{Eye, GazeEstimator};
use crate::detection::domain::landmark_model::{
    FrameImages, LandmarkFit, LandmarkModel, LandmarkRequest,
};
use crate::detection::domain::region_proposer::{CandidateRegion, CapabilityError, RegionProposer};
use crate::shared::camera::CameraIntrinsics;
use crate::shared::constants::{EYE_LANDMARK_COUNT, LANDMARK_COUNT};
use crate::shared::face_observation::NEUTRAL_GAZE;
use crate::shared::frame::Frame;
use crate::shared::geometry::{Point2, Point3, Pose};
use crate::shared::rect::Rect;

/// Warm tracking follows the trace face overlapping its last box at least
/// this much (standard IoU).
pub const MIN_FOLLOW_IOU: f64 = 0.3;

/// Assumed physical face width in millimetres, for depth from box width.
const FACE_WIDTH_MM: f64 = 150.0;

const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid trace JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("trace has no frames")]
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceFace {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_certainty")]
    pub certainty: f64,
}

fn default_certainty() -> f64 {
    1.0
}

impl TraceFace {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    #[serde(default)]
    pub faces: Vec<TraceFace>,
}

/// Recorded ground truth: the faces visible in each frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceTrace {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    pub frames: Vec<TraceFrame>,
}

fn default_frame_interval_ms() -> u64 {
    DEFAULT_FRAME_INTERVAL_MS
}

impl FaceTrace {
    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        let trace: FaceTrace = serde_json::from_str(json)?;
        if trace.frames.is_empty() {
            return Err(TraceError::Empty);
        }
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let json = fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Faces in frame `index`; none past the end of the trace.
    pub fn faces_at(&self, index: usize) -> &[TraceFace] {
        self.frames
            .get(index)
            .map(|f| f.faces.as_slice())
            .unwrap_or(&[])
    }

    /// Capture time of frame `index` relative to frame 0.
    pub fn frame_time(&self, index: usize) -> Duration {
        Duration::from_millis(self.frame_interval_ms.saturating_mul(index as u64))
    }
}

/// Proposes the trace's faces for the frame being processed.
pub struct ScriptedProposer {
    trace: Arc<FaceTrace>,
}

impl ScriptedProposer {
    pub fn new(trace: Arc<FaceTrace>) -> Self {
        Self { trace }
    }
}

impl RegionProposer for ScriptedProposer {
    fn propose(
        &mut self,
        image: &Frame,
        _kind: DetectorKind,
    ) -> Result<Vec<CandidateRegion>, CapabilityError> {
        Ok(self
            .trace
            .faces_at(image.index())
            .iter()
            .map(|f| CandidateRegion::new(f.rect(), f.certainty))
            .collect())
    }
}

/// Landmark model that localises faces by looking them up in the trace.
///
/// A seeded pass locks onto the trace face best overlapping the seed;
/// incremental passes follow the face best overlapping the last fit. A
/// miss keeps the last fit so the face can be picked up again.
pub struct ScriptedLandmarkModel {
    trace: Arc<FaceTrace>,
    current: Option<TraceFace>,
}

impl ScriptedLandmarkModel {
    pub fn new(trace: Arc<FaceTrace>) -> Self {
        Self {
            trace,
            current: None,
        }
    }

    fn best_match(&self, index: usize, reference: &Rect) -> Option<TraceFace> {
        self.trace
            .faces_at(index)
            .iter()
            .map(|f| (f, f.rect().iou(reference)))
            .filter(|(_, iou)| *iou >= MIN_FOLLOW_IOU)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(f, _)| *f)
    }
}

impl LandmarkModel for ScriptedLandmarkModel {
    fn detect(
        &mut self,
        images: &FrameImages<'_>,
        request: LandmarkRequest<'_>,
        _camera: &CameraIntrinsics,
    ) -> Result<bool, CapabilityError> {
        let reference = match request {
            LandmarkRequest::Seeded { region, .. } => *region,
            LandmarkRequest::Incremental => match &self.current {
                Some(face) => face.rect(),
                None => return Ok(false),
            },
        };
        match self.best_match(images.color.index(), &reference) {
            Some(face) => {
                self.current = Some(face);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn reset(&mut self) {
        self.current = None;
    }

    fn bounding_box(&self) -> Rect {
        self.current.map(|f| f.rect()).unwrap_or_default()
    }

    fn fit(&self, camera: &CameraIntrinsics) -> LandmarkFit {
        let Some(face) = self.current else {
            return LandmarkFit::default();
        };
        let rect = face.rect();
        let depth = face_depth(&rect, camera);
        let eye_landmarks_2d = eye_outline(&rect);
        let eye_landmarks_3d = eye_landmarks_2d
            .iter()
            .map(|p| camera.back_project(*p, depth))
            .collect();
        LandmarkFit {
            certainty: face.certainty,
            bounding_box: rect,
            pose: Pose::new(camera.back_project(rect.center(), depth), Point3::default()),
            landmarks: face_outline(&rect),
            eye_landmarks_2d,
            eye_landmarks_3d,
        }
    }
}

/// Gaze that always looks from the eye straight into the camera.
pub struct ScriptedGaze;

impl GazeEstimator for ScriptedGaze {
    fn estimate(&self, fit: &LandmarkFit, eye: Eye, _camera: &CameraIntrinsics) -> Point3 {
        let per_eye = EYE_LANDMARK_COUNT / 2;
        let points = match eye {
            Eye::Left => fit.eye_landmarks_3d.get(..per_eye),
            Eye::Right => fit.eye_landmarks_3d.get(per_eye..),
        };
        match points {
            Some(points) if !points.is_empty() => (Point3::default() - Point3::mean(points)).normalized(),
            _ => NEUTRAL_GAZE,
        }
    }
}

fn face_depth(rect: &Rect, camera: &CameraIntrinsics) -> f64 {
    if rect.width <= 0.0 {
        return 0.0;
    }
    camera.fx * FACE_WIDTH_MM / rect.width
}

/// Points evenly spaced on the ellipse inscribed in `rect`.
fn ellipse_points(center: Point2, rx: f64, ry: f64, count: usize) -> Vec<Point2> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            Point2::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect()
}

fn face_outline(rect: &Rect) -> Vec<Point2> {
    ellipse_points(rect.center(), rect.width / 2.0, rect.height / 2.0, LANDMARK_COUNT)
}

/// Left eye points then right eye points, each on a small circle.
fn eye_outline(rect: &Rect) -> Vec<Point2> {
    let per_eye = EYE_LANDMARK_COUNT / 2;
    let radius = rect.width * 0.06;
    let eye_y = rect.y + rect.height * 0.4;
    let left = Point2::new(rect.x + rect.width * 0.3, eye_y);
    let right = Point2::new(rect.x + rect.width * 0.7, eye_y);
    let mut points = ellipse_points(left, radius, radius, per_eye);
    points.extend(ellipse_points(right, radius, radius, per_eye));
    points
}
