//! Camera capture handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand};
use super::device::list_devices;
use super::types::{AcquisitionError, CameraSettings, Frame, Resolution};

/// Camera capture handle.
///
/// Wraps a nokhwa camera running in a background thread that continuously
/// captures frames and stores the latest one in a shared buffer. Call
/// `start()` to begin capturing and `latest_frame()` to snapshot the most
/// recent frame.
pub struct CameraCapture {
    /// Latest captured frame (shared with capture thread)
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Current settings
    settings: CameraSettings,
    /// Actual resolution (set after the stream opens)
    actual_resolution: Option<Resolution>,
    /// Actual FPS (set after the stream opens)
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Open a camera with the specified settings.
    ///
    /// This validates that the camera exists but doesn't actually open
    /// the camera stream until `start()` is called. The camera is opened
    /// inside the background thread to avoid thread-safety issues.
    ///
    /// # Errors
    /// * `AcquisitionError::DeviceNotFound` - If the device index doesn't exist
    pub fn open(settings: CameraSettings) -> Result<Self, AcquisitionError> {
        // First check if the device exists
        let devices = list_devices()?;
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(AcquisitionError::DeviceNotFound(
                settings.device_index.to_string(),
            ));
        }

        Ok(Self {
            frame_buffer: Arc::new(Mutex::new(None)),
            capture_thread: None,
            command_tx: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            actual_resolution: None,
            actual_fps: None,
        })
    }

    /// Get the current camera settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Get the actual resolution the camera is using.
    ///
    /// Returns `None` if the camera hasn't been started yet. This may
    /// differ from the requested resolution if the camera doesn't support
    /// it exactly.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    /// Get the actual frame rate the camera is using.
    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    /// Start capturing frames in a background thread.
    ///
    /// Blocks until the camera stream is open and actively producing, then
    /// records the actual resolution and frame rate. Frames are continuously
    /// captured into a shared buffer; use `latest_frame()` to read it.
    ///
    /// # Errors
    /// * `AcquisitionError::StreamFailed` - If the camera stream fails to start
    /// * `AcquisitionError::PermissionDenied` - If camera access is denied
    /// * `AcquisitionError::OpenFailed` - If the camera fails to open for other reasons
    pub fn start(&mut self) -> Result<(), AcquisitionError> {
        if self.is_running() {
            return Err(AcquisitionError::StreamFailed(
                "Capture thread is already running".to_string(),
            ));
        }

        // Reset stop signal
        self.stop_signal.store(false, Ordering::SeqCst);

        // Create channel for commands
        let (tx, rx) = mpsc::channel();
        self.command_tx = Some(tx);

        // Clone values for the capture thread
        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();

        // Channel to receive actual resolution/fps from the thread
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), AcquisitionError>>();

        // The camera is created inside the thread since it isn't Send
        let handle = std::thread::spawn(move || {
            run_capture_loop(settings, buffer, stop, rx, info_tx);
        });

        self.capture_thread = Some(handle);

        // Wait for the thread to report success or failure
        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                self.actual_resolution = Some(res);
                self.actual_fps = Some(fps);
                Ok(())
            }
            Ok(Err(e)) => {
                // Thread encountered an error, clean up
                self.stop_signal.store(true, Ordering::SeqCst);
                if let Some(h) = self.capture_thread.take() {
                    let _ = h.join();
                }
                Err(e)
            }
            Err(_) => {
                // Channel closed unexpectedly
                self.stop_signal.store(true, Ordering::SeqCst);
                if let Some(h) = self.capture_thread.take() {
                    let _ = h.join();
                }
                Err(AcquisitionError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Stop the capture thread.
    ///
    /// Signals the background thread to stop and waits for it to finish,
    /// which releases the underlying hardware track.
    pub fn stop(&mut self) {
        // Signal the thread to stop via atomic flag
        self.stop_signal.store(true, Ordering::SeqCst);

        // Also send stop command via channel (in case thread is blocked)
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }

        // Wait for thread to finish
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }

    /// Snapshot the latest captured frame.
    ///
    /// Returns `None` while the stream is still priming (no frame decoded
    /// yet) or when capturing is not running.
    pub fn latest_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Check if the capture thread is currently running.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
