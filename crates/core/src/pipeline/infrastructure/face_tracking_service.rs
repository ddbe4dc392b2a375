use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;

use crate::pipeline::fps_meter::FpsMeter;
use crate::pipeline::frame_mailbox::FrameMailbox;
use crate::pipeline::pipeline_logger::{report_cycle, PipelineLogger};
use crate::pipeline::tracking_config::{ConfigError, TrackingConfig};
use crate::pipeline::tracking_cycle::{TrackingBackends, TrackingCycle};
use crate::pipeline::tracking_event::TrackingEvent;
use crate::shared::constants::WORKER_THREAD_NAME;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid tracking config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("failed to spawn tracking worker: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("tracking worker panicked")]
    WorkerPanicked,
}

/// State shared between the handle and the worker thread.
struct Shared {
    mailbox: FrameMailbox,
    cancelled: AtomicBool,
    reset_requested: AtomicBool,
    fps: AtomicI32,
    frames_processed: AtomicU64,
    dropped_events: AtomicU64,
}

/// Runs tracking on a dedicated worker thread.
///
/// Producers hand frames in with [`set_image`](Self::set_image); the
/// worker always processes the newest pending frame, one full cycle at a
/// time, and publishes results on a bounded event channel. Frames that
/// arrive faster than the worker can process them are dropped, and so are
/// results that a lagging consumer has no room for.
pub struct FaceTrackingService {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<Box<dyn PipelineLogger>>>,
}

impl FaceTrackingService {
    pub fn start(
        config: TrackingConfig,
        backends: TrackingBackends,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<(Self, Receiver<TrackingEvent>), ServiceError> {
        let cycle = TrackingCycle::new(&config, backends)?;
        let shared = Arc::new(Shared {
            mailbox: FrameMailbox::new(),
            cancelled: AtomicBool::new(false),
            reset_requested: AtomicBool::new(false),
            fps: AtomicI32::new(0),
            frames_processed: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
        });
        let (event_tx, event_rx) = crossbeam_channel::bounded(config.event_capacity);

        let worker_shared = Arc::clone(&shared);
        let idle_sleep = config.idle_sleep();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(cycle, worker_shared, event_tx, logger, idle_sleep))
            .map_err(ServiceError::Spawn)?;

        Ok((
            Self {
                shared,
                worker: Some(worker),
            },
            event_rx,
        ))
    }

    /// Offers a frame to the worker, replacing any frame it has not
    /// picked up yet.
    pub fn set_image(&self, frame: Frame) {
        if self.shared.mailbox.put(frame) {
            log::trace!("Pending frame overwritten");
        }
    }

    /// Deactivates every model slot before the next cycle.
    pub fn reset_model(&self) {
        self.shared.reset_requested.store(true, Ordering::Release);
    }

    /// Smoothed processing rate; 0 until the first frame is processed.
    pub fn fps(&self) -> i32 {
        self.shared.fps.load(Ordering::Relaxed)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.shared.mailbox.dropped()
    }

    /// Result events discarded because the channel was full.
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped_events.load(Ordering::Relaxed)
    }

    pub fn frames_processed(&self) -> u64 {
        self.shared.frames_processed.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops and joins the worker, then emits the logger summary.
    /// Calling it again is a no-op.
    pub fn stop(&mut self) -> Result<(), ServiceError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        self.shared.cancelled.store(true, Ordering::Relaxed);
        let logger = worker.join().map_err(|_| ServiceError::WorkerPanicked)?;
        logger.summary();
        Ok(())
    }
}

impl Drop for FaceTrackingService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{e}");
        }
    }
}

fn run_worker(
    mut cycle: TrackingCycle,
    shared: Arc<Shared>,
    events: Sender<TrackingEvent>,
    mut logger: Box<dyn PipelineLogger>,
    idle_sleep: Duration,
) -> Box<dyn PipelineLogger> {
    logger.info("Tracking worker started");
    let mut fps = FpsMeter::default();

    while !shared.cancelled.load(Ordering::Relaxed) {
        if shared.reset_requested.swap(false, Ordering::AcqRel) {
            cycle.reset_models();
        }

        let Some(frame) = shared.mailbox.take() else {
            thread::sleep(idle_sleep);
            continue;
        };

        let start = Instant::now();
        let output = cycle.run(&frame, start);
        fps.record(start.elapsed());
        shared.fps.store(fps.fps_int(), Ordering::Relaxed);
        let processed = shared.frames_processed.fetch_add(1, Ordering::Relaxed) + 1;

        report_cycle(
            logger.as_mut(),
            &output.report,
            output.identity_ms,
            output.tracked.len(),
        );
        logger.metric("dropped_frames", shared.mailbox.dropped() as f64);
        logger.metric("dropped_events", shared.dropped_events.load(Ordering::Relaxed) as f64);
        logger.cycle_completed(output.frame_index, processed);

        let pair = [
            TrackingEvent::Observations {
                frame_index: output.frame_index,
                observations: output.observations,
            },
            TrackingEvent::Tracked {
                frame_index: output.frame_index,
                tracked: output.tracked,
            },
        ];
        let dropped = publish(&events, pair);
        if dropped > 0 {
            log::trace!("Event channel full, dropped frame #{} results", output.frame_index);
            shared.dropped_events.fetch_add(dropped, Ordering::Relaxed);
        }
    }

    logger.info("Tracking worker stopped");
    logger
}

/// Sends both events of a frame or neither, never blocking. Returns how
/// many were dropped for lack of room.
///
/// The worker is the only sender, so free space can only grow between
/// the check and the sends. A gone receiver only means nobody is
/// listening.
fn publish(events: &Sender<TrackingEvent>, pair: [TrackingEvent; 2]) -> u64 {
    let room = events
        .capacity()
        .map_or(usize::MAX, |cap| cap.saturating_sub(events.len()));
    if room < pair.len() {
        return pair.len() as u64;
    }
    for event in pair {
        let _ = events.try_send(event);
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detector_kind::DetectorKind;
    use crate::detection::domain::landmark_model::{
        FrameImages, LandmarkFit, LandmarkModel, LandmarkRequest,
    };
    use crate::detection::domain::region_proposer::{
        CandidateRegion, CapabilityError, RegionProposer,
    };
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::camera::CameraIntrinsics;
    use crate::shared::rect::Rect;

    struct NoFaces;

    impl RegionProposer for NoFaces {
        fn propose(
            &mut self,
            _image: &Frame,
            _kind: DetectorKind,
        ) -> Result<Vec<CandidateRegion>, CapabilityError> {
            Ok(Vec::new())
        }
    }

    struct NeverFits;

    impl LandmarkModel for NeverFits {
        fn detect(
            &mut self,
            _images: &FrameImages<'_>,
            _request: LandmarkRequest<'_>,
            _camera: &CameraIntrinsics,
        ) -> Result<bool, CapabilityError> {
            Ok(false)
        }

        fn reset(&mut self) {}

        fn bounding_box(&self) -> Rect {
            Rect::default()
        }

        fn fit(&self, _camera: &CameraIntrinsics) -> LandmarkFit {
            LandmarkFit::default()
        }
    }

    fn backends() -> TrackingBackends {
        TrackingBackends {
            proposer: Box::new(NoFaces),
            gaze: None,
            model_factory: Box::new(|_| Box::new(NeverFits) as Box<dyn LandmarkModel>),
        }
    }

    fn config() -> TrackingConfig {
        TrackingConfig {
            image_width: 16,
            image_height: 16,
            idle_sleep_ms: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_start_rejects_invalid_config() {
        let bad = TrackingConfig {
            detection_interval: 0,
            ..config()
        };
        let result = FaceTrackingService::start(bad, backends(), Box::new(NullPipelineLogger));
        assert!(matches!(result, Err(ServiceError::InvalidConfig(_))));
    }

    #[test]
    fn test_processes_frame_and_publishes_both_events() {
        let (mut service, events) =
            FaceTrackingService::start(config(), backends(), Box::new(NullPipelineLogger)).unwrap();
        service.set_image(Frame::blank(16, 16, 7));

        let first = events.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = events.recv_timeout(Duration::from_secs(5)).unwrap();
        match first {
            TrackingEvent::Observations { frame_index, observations } => {
                assert_eq!(frame_index, 7);
                assert_eq!(observations.len(), 4);
            }
            other => panic!("expected observations first, got {other:?}"),
        }
        assert!(matches!(second, TrackingEvent::Tracked { frame_index: 7, .. }));
        assert_eq!(service.frames_processed(), 1);

        service.stop().unwrap();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut service, _events) =
            FaceTrackingService::start(config(), backends(), Box::new(NullPipelineLogger)).unwrap();
        assert!(service.is_running());
        service.stop().unwrap();
        assert!(!service.is_running());
        service.stop().unwrap();
    }

    #[test]
    fn test_fps_zero_before_first_frame() {
        let (service, _events) =
            FaceTrackingService::start(config(), backends(), Box::new(NullPipelineLogger)).unwrap();
        assert_eq!(service.fps(), 0);
        assert_eq!(service.dropped_frames(), 0);
    }

    #[test]
    fn test_worker_survives_dropped_receiver() {
        let (mut service, events) =
            FaceTrackingService::start(config(), backends(), Box::new(NullPipelineLogger)).unwrap();
        drop(events);
        service.set_image(Frame::blank(16, 16, 0));
        let deadline = Instant::now() + Duration::from_secs(5);
        while service.frames_processed() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(service.frames_processed(), 1);
        assert!(service.is_running());
        service.stop().unwrap();
    }

    fn frame_event(index: usize) -> TrackingEvent {
        TrackingEvent::Tracked {
            frame_index: index,
            tracked: Vec::new(),
        }
    }

    #[test]
    fn test_publish_drops_whole_pair_when_full() {
        let (tx, rx) = crossbeam_channel::bounded(3);
        assert_eq!(publish(&tx, [frame_event(0), frame_event(0)]), 0);
        assert_eq!(publish(&tx, [frame_event(1), frame_event(1)]), 2);
        assert_eq!(rx.len(), 2);

        rx.recv().unwrap();
        assert_eq!(publish(&tx, [frame_event(2), frame_event(2)]), 0);
        assert_eq!(rx.len(), 3);
    }

    #[test]
    fn test_undrained_events_stay_within_capacity() {
        let cfg = TrackingConfig {
            event_capacity: 6,
            ..config()
        };
        let (mut service, events) =
            FaceTrackingService::start(cfg, backends(), Box::new(NullPipelineLogger)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut index = 0;
        while service.frames_processed() < 20 && Instant::now() < deadline {
            service.set_image(Frame::blank(16, 16, index));
            index += 1;
            thread::sleep(Duration::from_millis(1));
        }
        service.stop().unwrap();

        let processed = service.frames_processed();
        assert!(processed >= 20);
        assert_eq!(events.len(), 6);
        assert_eq!(service.dropped_events(), 2 * processed - 6);
    }
}
