use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use facetrack_core::detection::domain::detector_kind::DetectorKind;
use facetrack_core::detection::domain::landmark_model::LandmarkModel;
use facetrack_core::detection::domain::region_proposer::{
    CandidateRegion, CapabilityError, RegionProposer,
};
use facetrack_core::detection::infrastructure::scripted_backend::{
    FaceTrace, ScriptedLandmarkModel, TraceFace, TraceFrame,
};
use facetrack_core::pipeline::infrastructure::face_tracking_service::FaceTrackingService;
use facetrack_core::pipeline::pipeline_logger::NullPipelineLogger;
use facetrack_core::pipeline::tracking_config::TrackingConfig;
use facetrack_core::pipeline::tracking_cycle::TrackingBackends;
use facetrack_core::pipeline::tracking_event::TrackingEvent;
use facetrack_core::shared::frame::Frame;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Blocks inside the first proposal until released, so the test can pile
/// frames up while the worker is busy.
struct GatedProposer {
    entered: Sender<usize>,
    release: Receiver<()>,
    gated: bool,
}

impl RegionProposer for GatedProposer {
    fn propose(
        &mut self,
        image: &Frame,
        _kind: DetectorKind,
    ) -> Result<Vec<CandidateRegion>, CapabilityError> {
        if self.gated {
            self.gated = false;
            self.entered.send(image.index())?;
            self.release.recv()?;
        }
        Ok(Vec::new())
    }
}

fn config() -> TrackingConfig {
    TrackingConfig {
        image_width: 32,
        image_height: 24,
        max_faces: 2,
        idle_sleep_ms: 1,
        ..Default::default()
    }
}

fn frame(index: usize) -> Frame {
    Frame::new(vec![index as u8; 32 * 24 * 3], 32, 24, 3, index)
}

fn trace_with_face(frames: usize) -> Arc<FaceTrace> {
    let face = TraceFace {
        x: 4.0,
        y: 4.0,
        width: 12.0,
        height: 12.0,
        certainty: 0.9,
    };
    Arc::new(FaceTrace {
        frame_interval_ms: 33,
        frames: vec![TraceFrame { faces: vec![face] }; frames],
    })
}

fn next_frame_index(events: &Receiver<TrackingEvent>) -> usize {
    let observations = events.recv_timeout(TIMEOUT).unwrap();
    let tracked = events.recv_timeout(TIMEOUT).unwrap();
    assert!(matches!(observations, TrackingEvent::Observations { .. }));
    assert!(matches!(tracked, TrackingEvent::Tracked { .. }));
    assert_eq!(observations.frame_index(), tracked.frame_index());
    observations.frame_index()
}

#[test]
fn newest_pending_frame_wins() {
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (release_tx, release_rx) = crossbeam_channel::bounded(1);
    let trace = trace_with_face(8);
    let backends = TrackingBackends {
        proposer: Box::new(GatedProposer {
            entered: entered_tx,
            release: release_rx,
            gated: true,
        }),
        gaze: None,
        model_factory: Box::new(move |_| {
            Box::new(ScriptedLandmarkModel::new(Arc::clone(&trace))) as Box<dyn LandmarkModel>
        }),
    };
    let (mut service, events) =
        FaceTrackingService::start(config(), backends, Box::new(NullPipelineLogger)).unwrap();

    service.set_image(frame(0));
    assert_eq!(entered_rx.recv_timeout(TIMEOUT).unwrap(), 0);

    // worker is busy with frame 0: A then B, only B may be processed
    service.set_image(frame(1));
    service.set_image(frame(2));
    release_tx.send(()).unwrap();

    assert_eq!(next_frame_index(&events), 0);
    assert_eq!(next_frame_index(&events), 2);
    assert!(events.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(service.dropped_frames(), 1);
    assert_eq!(service.frames_processed(), 2);

    service.stop().unwrap();
}

#[test]
fn reset_model_frees_every_slot() {
    let (mut service, events) = FaceTrackingService::start(
        config(),
        TrackingBackends::scripted(trace_with_face(8)),
        Box::new(NullPipelineLogger),
    )
    .unwrap();

    service.set_image(frame(0));
    match events.recv_timeout(TIMEOUT).unwrap() {
        TrackingEvent::Observations { observations, .. } => {
            assert_eq!(observations.len(), 2);
            assert!(observations[0].detected || observations[1].detected);
        }
        other => panic!("unexpected {other:?}"),
    }
    events.recv_timeout(TIMEOUT).unwrap();

    service.reset_model();
    service.set_image(frame(1));
    match events.recv_timeout(TIMEOUT).unwrap() {
        TrackingEvent::Observations { observations, .. } => {
            // frame 1 is off the proposal cadence, so nothing is reclaimed
            assert!(observations.iter().all(|o| !o.detected));
        }
        other => panic!("unexpected {other:?}"),
    }
    match events.recv_timeout(TIMEOUT).unwrap() {
        // identities outlive a model reset until they expire
        TrackingEvent::Tracked { tracked, .. } => assert_eq!(tracked.len(), 1),
        other => panic!("unexpected {other:?}"),
    }

    service.stop().unwrap();
}

/// Slow enough that cycle time never rounds to zero.
struct SlowProposer;

impl RegionProposer for SlowProposer {
    fn propose(
        &mut self,
        _image: &Frame,
        _kind: DetectorKind,
    ) -> Result<Vec<CandidateRegion>, CapabilityError> {
        thread::sleep(Duration::from_millis(5));
        Ok(Vec::new())
    }
}

#[test]
fn fps_reported_after_processing() {
    let trace = trace_with_face(1);
    let backends = TrackingBackends {
        proposer: Box::new(SlowProposer),
        gaze: None,
        model_factory: Box::new(move |_| {
            Box::new(ScriptedLandmarkModel::new(Arc::clone(&trace))) as Box<dyn LandmarkModel>
        }),
    };
    let cfg = TrackingConfig {
        detection_interval: 1,
        ..config()
    };
    let (mut service, events) =
        FaceTrackingService::start(cfg, backends, Box::new(NullPipelineLogger)).unwrap();
    assert_eq!(service.fps(), 0);

    for i in 0..3 {
        service.set_image(frame(i));
        next_frame_index(&events);
    }
    let fps = service.fps();
    assert!(fps > 0 && fps <= 200, "fps {fps}");

    service.stop().unwrap();
}

#[test]
fn dropping_the_service_stops_the_worker() {
    let (service, events) = FaceTrackingService::start(
        config(),
        TrackingBackends::scripted(trace_with_face(1)),
        Box::new(NullPipelineLogger),
    )
    .unwrap();
    drop(service);
    // the worker owned the only sender
    assert!(matches!(
        events.recv_timeout(TIMEOUT),
        Err(crossbeam_channel::RecvTimeoutError::Disconnected)
    ));
}
