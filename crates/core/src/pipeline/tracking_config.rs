use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detector_kind::{DetectorKind, LandmarkDetectorKind};
use crate::detection::domain::model_pool::PoolSettings;
use crate::shared::camera::CameraIntrinsics;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_CERTAINTY_THRESHOLD,
    DEFAULT_DISAPPEARANCE_GRACE_MS, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH,
    DEFAULT_MAX_DISTANCE_PX, DEFAULT_MAX_FACES, DEFAULT_PERSISTENCE_MS, DETECTION_INTERVAL,
    EVENT_CHANNEL_CAPACITY, IDLE_SLEEP_MS, MAX_CONSECUTIVE_FAILURES, OVERLAP_THRESHOLD,
};
use crate::tracking::domain::identity_tracker::IdentitySettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("no platform config directory available")]
    NoConfigDir,
}

/// Setup-time configuration for the tracker.
///
/// Passed by value into the components that need it; nothing reads it
/// from global state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub track_multiple_faces: bool,
    pub image_width: u32,
    pub image_height: u32,
    pub detector: DetectorKind,
    /// Handed to the model factory when the slots are built.
    pub landmark_detector: LandmarkDetectorKind,
    /// `None` uses [`CameraIntrinsics::for_image`] with the image size.
    pub camera: Option<CameraIntrinsics>,
    pub persistence_ms: u64,
    pub max_distance_px: f64,
    pub max_faces: usize,
    pub certainty_threshold: f64,
    pub disappearance_grace_ms: u64,
    pub detection_interval: u64,
    pub max_consecutive_failures: u32,
    pub overlap_threshold: f64,
    pub idle_sleep_ms: u64,
    /// Bound on undelivered result events.
    pub event_capacity: usize,
    pub parallel_slots: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            track_multiple_faces: true,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            detector: DetectorKind::default(),
            landmark_detector: LandmarkDetectorKind::default(),
            camera: None,
            persistence_ms: DEFAULT_PERSISTENCE_MS,
            max_distance_px: DEFAULT_MAX_DISTANCE_PX,
            max_faces: DEFAULT_MAX_FACES,
            certainty_threshold: DEFAULT_CERTAINTY_THRESHOLD,
            disappearance_grace_ms: DEFAULT_DISAPPEARANCE_GRACE_MS,
            detection_interval: DETECTION_INTERVAL,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            overlap_threshold: OVERLAP_THRESHOLD,
            idle_sleep_ms: IDLE_SLEEP_MS,
            event_capacity: EVENT_CHANNEL_CAPACITY,
            parallel_slots: true,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(invalid(
                "image_width/image_height",
                format!("{}x{} has a zero dimension", self.image_width, self.image_height),
            ));
        }
        if self.max_faces == 0 {
            return Err(invalid("max_faces", "must be at least 1".into()));
        }
        if self.detection_interval == 0 {
            return Err(invalid("detection_interval", "must be at least 1".into()));
        }
        if let Some(camera) = &self.camera {
            if !(camera.fx.is_finite() && camera.fx > 0.0 && camera.fy.is_finite() && camera.fy > 0.0)
            {
                return Err(invalid(
                    "camera",
                    format!("focal lengths must be positive, got fx={} fy={}", camera.fx, camera.fy),
                ));
            }
            if !(camera.cx.is_finite() && camera.cy.is_finite()) {
                return Err(invalid("camera", "principal point must be finite".into()));
            }
        }
        if self.max_distance_px.is_nan() || self.max_distance_px < 0.0 {
            return Err(invalid(
                "max_distance_px",
                format!("{} is not a non-negative distance", self.max_distance_px),
            ));
        }
        if !(0.0..=1.0).contains(&self.certainty_threshold) {
            return Err(invalid(
                "certainty_threshold",
                format!("{} is outside [0, 1]", self.certainty_threshold),
            ));
        }
        if !(self.overlap_threshold > 0.0 && self.overlap_threshold <= 1.0) {
            return Err(invalid(
                "overlap_threshold",
                format!("{} is outside (0, 1]", self.overlap_threshold),
            ));
        }
        if self.event_capacity < 2 {
            return Err(invalid(
                "event_capacity",
                format!("{} cannot hold one frame's pair of events", self.event_capacity),
            ));
        }
        Ok(())
    }

    /// Number of model slots: one in single-face mode.
    pub fn slot_count(&self) -> usize {
        if self.track_multiple_faces {
            self.max_faces
        } else {
            1
        }
    }

    pub fn camera(&self) -> CameraIntrinsics {
        self.camera
            .unwrap_or_else(|| CameraIntrinsics::for_image(self.image_width, self.image_height))
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            detector: self.detector,
            camera: self.camera(),
            detection_interval: self.detection_interval,
            max_consecutive_failures: self.max_consecutive_failures,
            overlap_threshold: self.overlap_threshold,
            parallel: self.parallel_slots,
        }
    }

    pub fn identity_settings(&self) -> IdentitySettings {
        IdentitySettings {
            persistence: Duration::from_millis(self.persistence_ms),
            max_distance_px: self.max_distance_px,
            certainty_threshold: self.certainty_threshold,
            disappearance_grace: Duration::from_millis(self.disappearance_grace_ms),
            single_face: !self.track_multiple_faces,
        }
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }

    /// `<platform config dir>/facetrack/config.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads and validates a config file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TrackingConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at [`default_path`](Self::default_path) if it exists,
    /// defaults otherwise.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Ok(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
