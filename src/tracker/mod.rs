//! The detection loop orchestrator.
//!
//! A single task owns the whole cycle: it serves start commands from the
//! host, gates on stream acquisition and capability readiness, then runs the
//! per-tick sample -> deliver -> infer -> deliver cycle until superseded by
//! the next start command or process end.

mod scheduler;

pub use scheduler::{GenerationCounter, GenerationToken, TickScheduler};

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::bridge::{HostBridge, HostCommand, HostEvent};
use crate::camera::{AcquisitionError, Sample, StreamManager};
use crate::encode;
use crate::pose::{self, DetectorLoader, KeypointName, SharedEstimator, TARGET_CANDIDATES};

/// The video-source seam the orchestrator drives.
///
/// Production implementation is [`StreamManager`]; tests substitute scripted
/// sources.
#[async_trait]
pub trait StreamSource: Send {
    /// Tear down any live stream, then acquire one for `device_id`.
    async fn acquire(&mut self, device_id: &str) -> Result<(), AcquisitionError>;
    /// Release the live stream, if any.
    fn release(&mut self);
    /// Sample the live stream; `None` when no stream is live.
    fn sample(&mut self) -> Option<Sample>;
}

#[async_trait]
impl StreamSource for StreamManager {
    async fn acquire(&mut self, device_id: &str) -> Result<(), AcquisitionError> {
        StreamManager::acquire(self, device_id).await
    }

    fn release(&mut self) {
        StreamManager::release(self)
    }

    fn sample(&mut self) -> Option<Sample> {
        self.session().map(|session| session.sample())
    }
}

/// Lifecycle of the detection loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No active loop; waiting for a start command.
    Idle,
    /// Stream acquisition and capability initialization in flight.
    AwaitingCapability,
    /// Steady-state per-tick cycle.
    Streaming,
}

/// Orchestrator tuning.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Tick cadence while streaming.
    pub tick_hz: u32,
    /// JPEG quality for frame payloads (1-100).
    pub jpeg_quality: u8,
    /// The candidate landmark pair the extractor picks between.
    pub candidates: (KeypointName, KeypointName),
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_hz: 30,
            jpeg_quality: 75,
            candidates: TARGET_CANDIDATES,
        }
    }
}

/// State carried by one loop instance, discarded on supersession.
struct ActiveLoop {
    token: GenerationToken,
    detector: SharedEstimator,
    scheduler: TickScheduler,
    first_frame_signaled: bool,
}

enum Wake {
    Command(Option<HostCommand>),
    Tick,
}

/// The root controller composing stream source, capability loader, and host
/// bridge. At most one instance of the loop runs at any time; a new start
/// command supersedes (never merges with) the running one.
pub struct Tracker<S: StreamSource> {
    streams: S,
    loader: DetectorLoader,
    host: Arc<dyn HostBridge>,
    config: TrackerConfig,
    generations: GenerationCounter,
    active: Option<ActiveLoop>,
    state: LoopState,
}

impl<S: StreamSource> Tracker<S> {
    pub fn new(
        streams: S,
        loader: DetectorLoader,
        host: Arc<dyn HostBridge>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            streams,
            loader,
            host,
            config,
            generations: GenerationCounter::new(),
            active: None,
            state: LoopState::Idle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Serve commands and ticks until the command channel closes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<HostCommand>) {
        loop {
            let wake = match self.active.as_mut() {
                Some(active) => tokio::select! {
                    maybe_cmd = commands.recv() => Wake::Command(maybe_cmd),
                    _ = active.scheduler.tick() => Wake::Tick,
                },
                None => Wake::Command(commands.recv().await),
            };

            match wake {
                Wake::Command(Some(HostCommand::StartTracking { device_id })) => {
                    self.start_tracking(&device_id).await;
                }
                Wake::Command(None) => break,
                Wake::Tick => self.run_tick().await,
            }
        }

        self.streams.release();
    }

    /// Begin a new loop instance for `device_id`, superseding any running
    /// one.
    ///
    /// The superseded loop's scheduled work is invalidated via the
    /// generation counter and its stream is torn down (inside the source's
    /// acquire) before the new device is opened. On failure the tracker
    /// returns to `Idle` and waits for the next start command; there is no
    /// automatic retry.
    pub async fn start_tracking(&mut self, device_id: &str) {
        log::info!("Start tracking requested for device '{}'", device_id);

        self.active = None;
        let token = self.generations.advance();
        self.state = LoopState::AwaitingCapability;

        // Stream acquisition and capability initialization run concurrently.
        let (acquired, detector) = tokio::join!(
            self.streams.acquire(device_id),
            self.loader.ensure_ready(),
        );

        let detector = match (acquired, detector) {
            (Ok(()), Ok(detector)) => detector,
            (Err(e), _) => {
                log::error!("Stream acquisition failed: {}", e);
                self.state = LoopState::Idle;
                return;
            }
            (Ok(()), Err(e)) => {
                log::error!("Capability initialization failed: {}", e);
                self.streams.release();
                self.state = LoopState::Idle;
                return;
            }
        };

        self.active = Some(ActiveLoop {
            token,
            detector,
            scheduler: TickScheduler::new(self.config.tick_hz),
            first_frame_signaled: false,
        });
        self.state = LoopState::Streaming;
    }

    /// One iteration of the steady-state cycle.
    ///
    /// Every failure mode here is per-tick: the loop always remains
    /// scheduled, whatever this tick produced.
    pub async fn run_tick(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        // A tick belonging to a superseded loop delivers nothing.
        if !active.token.is_current() {
            return;
        }

        let frame = match self.streams.sample() {
            Some(Sample::Frame(frame)) => frame,
            // Source still priming; no detection this tick
            Some(Sample::Priming) => return,
            None => return,
        };

        match encode::frame_to_data_uri(&frame, self.config.jpeg_quality) {
            Ok(data_uri) => self.host.notify(HostEvent::Frame(data_uri)),
            Err(e) => {
                log::warn!("Frame encoding failed: {}", e);
                return;
            }
        }

        // Fires exactly once per loop instance, after the first delivered
        // frame and before any landmark of the same tick.
        if !active.first_frame_signaled {
            self.host.notify(HostEvent::CameraReady);
            active.first_frame_signaled = true;
        }

        match pose::extract(active.detector.as_ref(), &frame, self.config.candidates).await {
            Ok(Some(point)) => {
                if active.token.is_current() {
                    self.host.notify(HostEvent::Landmark(point));
                }
            }
            Ok(None) => {} // no usable landmark this tick
            Err(e) => log::warn!("Pose inference failed: {}", e),
        }
    }
}
