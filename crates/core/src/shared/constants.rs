/// Region proposal runs on every Nth processed frame.
pub const DETECTION_INTERVAL: u64 = 8;

/// A slot whose consecutive failure count exceeds this is deactivated.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 4;

/// Proposals scoring above this against an active slot's box are dropped.
pub const OVERLAP_THRESHOLD: f64 = 0.5;

pub const DEFAULT_MAX_FACES: usize = 4;
pub const DEFAULT_IMAGE_WIDTH: u32 = 640;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 480;
pub const DEFAULT_PERSISTENCE_MS: u64 = 1000;
pub const DEFAULT_MAX_DISTANCE_PX: f64 = 200.0;
pub const DEFAULT_CERTAINTY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_DISAPPEARANCE_GRACE_MS: u64 = 500;

/// Worker sleep when no new frame is pending.
pub const IDLE_SLEEP_MS: u64 = 20;

/// Results queued for a slow consumer before the worker drops new ones.
/// Each processed frame publishes two events.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Weight of the previous average in the smoothed cycle time.
pub const FPS_SMOOTHING: f64 = 0.9;

pub const LANDMARK_COUNT: usize = 68;
/// 28 per eye: 8 iris, 12 eyelid, 8 pupil.
pub const EYE_LANDMARK_COUNT: usize = 56;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const CONFIG_DIR_NAME: &str = "facetrack";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const WORKER_THREAD_NAME: &str = "facetrack-worker";
