//! End-to-end tests for the detection loop orchestrator.
//!
//! The tracker is driven tick-by-tick with scripted collaborators: a
//! scripted frame source, a scripted estimator, and a recording host
//! bridge. This covers the loop lifecycle, the one-time ready signal,
//! supersession, and hardware release ordering.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;

use pose_relay::bridge::{CameraDevice, HostBridge, HostEvent};
use pose_relay::camera::{AcquisitionError, Frame, Sample};
use pose_relay::pose::{
    DetectorLoader, InferenceError, Keypoint, KeypointName, Pose, PoseEstimator, SharedEstimator,
};
use pose_relay::tracker::{LoopState, StreamSource, Tracker, TrackerConfig};

// ---------------------------------------------------------------------------
// Scripted collaborators
// ---------------------------------------------------------------------------

/// Host bridge that records every delivered event.
#[derive(Default)]
struct RecordingBridge {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingBridge {
    fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    fn channels(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.channel()).collect()
    }
}

impl HostBridge for RecordingBridge {
    fn notify(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Frame source fed from a script; `None` entries mean the source is still
/// priming. Hardware open/close ordering is recorded for assertions.
struct ScriptedSource {
    feed: VecDeque<Option<Frame>>,
    live: Option<String>,
    hardware_log: Arc<Mutex<Vec<String>>>,
    fail_acquire: bool,
}

impl ScriptedSource {
    fn new(feed: Vec<Option<Frame>>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                feed: feed.into(),
                live: None,
                hardware_log: Arc::clone(&log),
                fail_acquire: false,
            },
            log,
        )
    }

    fn failing() -> Self {
        Self {
            feed: VecDeque::new(),
            live: None,
            hardware_log: Arc::new(Mutex::new(Vec::new())),
            fail_acquire: true,
        }
    }
}

#[async_trait]
impl StreamSource for ScriptedSource {
    async fn acquire(&mut self, device_id: &str) -> Result<(), AcquisitionError> {
        // Prior hardware must be closed before the new device is opened
        self.release();
        if self.fail_acquire {
            return Err(AcquisitionError::DeviceNotFound(device_id.to_string()));
        }
        self.hardware_log
            .lock()
            .unwrap()
            .push(format!("open:{}", device_id));
        self.live = Some(device_id.to_string());
        Ok(())
    }

    fn release(&mut self) {
        if let Some(id) = self.live.take() {
            self.hardware_log.lock().unwrap().push(format!("close:{}", id));
        }
    }

    fn sample(&mut self) -> Option<Sample> {
        self.live.as_ref()?;
        Some(match self.feed.pop_front() {
            Some(Some(frame)) => Sample::Frame(frame),
            _ => Sample::Priming,
        })
    }
}

/// Estimator fed from a script of per-call results; empty script means no
/// detections.
struct ScriptedEstimator {
    results: Mutex<VecDeque<Result<Vec<Pose>, InferenceError>>>,
}

impl ScriptedEstimator {
    fn new(results: Vec<Result<Vec<Pose>, InferenceError>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
        })
    }
}

#[async_trait]
impl PoseEstimator for ScriptedEstimator {
    async fn estimate(&self, _frame: &Frame) -> Result<Vec<Pose>, InferenceError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

fn loader_for(estimator: Arc<ScriptedEstimator>) -> DetectorLoader {
    DetectorLoader::with_factory(Box::new(move || {
        let shared: SharedEstimator = estimator.clone();
        Box::pin(async move { Ok(shared) })
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn frame(width: u32, height: u32) -> Frame {
    Frame {
        data: vec![100; (width * height * 3) as usize],
        width,
        height,
        timestamp: Instant::now(),
    }
}

fn ankle_pose(left: (f32, f32, f32), right: (f32, f32, f32)) -> Pose {
    Pose {
        keypoints: vec![
            Keypoint {
                name: KeypointName::LeftAnkle,
                x: left.0,
                y: left.1,
                score: left.2,
            },
            Keypoint {
                name: KeypointName::RightAnkle,
                x: right.0,
                y: right.1,
                score: right.2,
            },
        ],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_scenario() {
    // Acquisition at 640x480; first tick primes, second delivers a frame,
    // third yields a landmark at (0.42, 0.77).
    let (source, _log) = ScriptedSource::new(vec![
        None,
        Some(frame(640, 480)),
        Some(frame(640, 480)),
    ]);
    let estimator = ScriptedEstimator::new(vec![
        Ok(vec![]),
        Ok(vec![ankle_pose(
            (0.42 * 640.0, 0.77 * 480.0, 0.9),
            (10.0, 10.0, 0.1),
        )]),
    ]);
    let bridge = Arc::new(RecordingBridge::default());

    let mut tracker = Tracker::new(
        source,
        loader_for(estimator),
        bridge.clone(),
        TrackerConfig::default(),
    );

    assert_eq!(tracker.state(), LoopState::Idle);
    tracker.start_tracking("cam-1").await;
    assert_eq!(tracker.state(), LoopState::Streaming);

    tracker.run_tick().await; // priming: no messages
    tracker.run_tick().await; // frame + one-time ready
    tracker.run_tick().await; // frame + landmark

    assert_eq!(
        bridge.channels(),
        vec!["frame", "camera-ready", "frame", "landmark"]
    );

    let events = bridge.events();
    match &events[3] {
        HostEvent::Landmark(point) => {
            assert!((point.x - 0.42).abs() < 1e-5, "x was {}", point.x);
            assert!((point.y - 0.77).abs() < 1e-5, "y was {}", point.y);
        }
        other => panic!("expected landmark, got {:?}", other),
    }
}

#[tokio::test]
async fn ready_signal_fires_exactly_once_per_loop() {
    let (source, _log) = ScriptedSource::new(vec![
        Some(frame(320, 240)),
        Some(frame(320, 240)),
        Some(frame(320, 240)),
        Some(frame(320, 240)),
    ]);
    let bridge = Arc::new(RecordingBridge::default());
    let mut tracker = Tracker::new(
        source,
        loader_for(ScriptedEstimator::new(vec![])),
        bridge.clone(),
        TrackerConfig::default(),
    );

    tracker.start_tracking("0").await;
    tracker.run_tick().await;
    tracker.run_tick().await;
    tracker.run_tick().await;

    let ready_count = bridge
        .channels()
        .iter()
        .filter(|c| **c == "camera-ready")
        .count();
    assert_eq!(ready_count, 1, "ready must fire once across many frames");

    // A device switch starts a fresh loop instance; its first successful
    // frame re-arms the one-time signal.
    tracker.start_tracking("1").await;
    tracker.run_tick().await;

    let ready_count = bridge
        .channels()
        .iter()
        .filter(|c| **c == "camera-ready")
        .count();
    assert_eq!(ready_count, 2);
}

#[tokio::test]
async fn device_switch_closes_old_hardware_before_opening_new() {
    let (source, log) = ScriptedSource::new(vec![
        Some(frame(320, 240)),
        Some(frame(320, 240)),
    ]);
    let bridge = Arc::new(RecordingBridge::default());
    let mut tracker = Tracker::new(
        source,
        loader_for(ScriptedEstimator::new(vec![])),
        bridge.clone(),
        TrackerConfig::default(),
    );

    tracker.start_tracking("0").await;
    tracker.run_tick().await;
    tracker.start_tracking("1").await;
    tracker.run_tick().await;

    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["open:0", "close:0", "open:1"],
        "the prior track must be released before the new acquisition"
    );

    // Nothing from the superseded loop reaches the host after the switch:
    // the second ready signal belongs to the new loop's first frame.
    assert_eq!(
        bridge.channels(),
        vec!["frame", "camera-ready", "frame", "camera-ready"]
    );
}

#[tokio::test]
async fn failed_acquisition_returns_to_idle() {
    let bridge = Arc::new(RecordingBridge::default());
    let mut tracker = Tracker::new(
        ScriptedSource::failing(),
        loader_for(ScriptedEstimator::new(vec![])),
        bridge.clone(),
        TrackerConfig::default(),
    );

    tracker.start_tracking("7").await;
    assert_eq!(tracker.state(), LoopState::Idle);

    // No loop is running: ticks deliver nothing
    tracker.run_tick().await;
    assert!(bridge.events().is_empty());
}

#[tokio::test]
async fn failed_capability_init_releases_stream_and_is_host_retryable() {
    use pose_relay::pose::CapabilityInitError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let attempts = Arc::new(AtomicUsize::new(0));
    let estimator = ScriptedEstimator::new(vec![]);
    let counter = attempts.clone();
    let loader = DetectorLoader::with_factory(Box::new(move || {
        let counter = counter.clone();
        let estimator = estimator.clone();
        Box::pin(async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(CapabilityInitError::ModelLoadFailed("weights missing".into()))
            } else {
                let shared: SharedEstimator = estimator;
                Ok(shared)
            }
        })
    }));

    let (source, log) = ScriptedSource::new(vec![Some(frame(320, 240))]);
    let bridge = Arc::new(RecordingBridge::default());
    let mut tracker = Tracker::new(source, loader, bridge.clone(), TrackerConfig::default());

    // First attempt: stream comes up but the capability does not
    tracker.start_tracking("0").await;
    assert_eq!(tracker.state(), LoopState::Idle);
    assert_eq!(log.lock().unwrap().clone(), vec!["open:0", "close:0"]);
    assert!(bridge.events().is_empty());

    // Retry is host-driven: a fresh start command succeeds
    tracker.start_tracking("0").await;
    assert_eq!(tracker.state(), LoopState::Streaming);
    tracker.run_tick().await;
    assert_eq!(bridge.channels(), vec!["frame", "camera-ready"]);
}

#[tokio::test]
async fn inference_fault_skips_one_tick_only() {
    let (source, _log) = ScriptedSource::new(vec![
        Some(frame(320, 240)),
        Some(frame(320, 240)),
    ]);
    let estimator = ScriptedEstimator::new(vec![
        Err(InferenceError("backend fault".to_string())),
        Ok(vec![ankle_pose((160.0, 120.0, 0.8), (0.0, 0.0, 0.0))]),
    ]);
    let bridge = Arc::new(RecordingBridge::default());
    let mut tracker = Tracker::new(
        source,
        loader_for(estimator),
        bridge.clone(),
        TrackerConfig::default(),
    );

    tracker.start_tracking("0").await;
    tracker.run_tick().await; // inference faults: frame still delivered
    tracker.run_tick().await; // loop continued; landmark arrives

    assert_eq!(
        bridge.channels(),
        vec!["frame", "camera-ready", "frame", "landmark"]
    );
}

#[tokio::test]
async fn low_confidence_yields_no_landmark_message() {
    let (source, _log) = ScriptedSource::new(vec![Some(frame(320, 240))]);
    let estimator = ScriptedEstimator::new(vec![Ok(vec![ankle_pose(
        (10.0, 10.0, 0.2),
        (20.0, 20.0, 0.1),
    )])]);
    let bridge = Arc::new(RecordingBridge::default());
    let mut tracker = Tracker::new(
        source,
        loader_for(estimator),
        bridge.clone(),
        TrackerConfig::default(),
    );

    tracker.start_tracking("0").await;
    tracker.run_tick().await;

    assert_eq!(bridge.channels(), vec!["frame", "camera-ready"]);
}

#[test]
fn device_list_is_delivered_on_attachment() {
    let bridge = RecordingBridge::default();
    let devices = vec![
        CameraDevice {
            label: "FaceTime HD Camera".to_string(),
            device_id: "0".to_string(),
        },
        CameraDevice {
            label: "USB Camera".to_string(),
            device_id: "1".to_string(),
        },
    ];

    bridge.notify_device_list(&devices);

    let events = bridge.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], HostEvent::CameraList(devices));
}
