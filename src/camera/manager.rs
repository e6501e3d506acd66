//! Stream session ownership: acquire, sample, release.

use super::capture::CameraCapture;
use super::types::{AcquisitionError, CameraSettings, Frame, Resolution};

/// Result of sampling the stream on one scheduling tick.
#[derive(Debug)]
pub enum Sample {
    /// A frame snapshot, valid for this tick only.
    Frame(Frame),
    /// The source has not produced a decodable frame yet. This is a normal,
    /// expected condition during the first ticks after acquisition, not an
    /// error.
    Priming,
}

/// A live video stream for one selected device.
///
/// Owned exclusively by [`StreamManager`]; at most one exists per process.
pub struct StreamSession {
    device_id: String,
    capture: CameraCapture,
    resolution: Resolution,
}

impl StreamSession {
    /// The identifier this session was acquired for.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Native resolution reported by the source when the stream opened.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Capture the current frame, or report that the source is still priming.
    ///
    /// The returned frame carries its own dimensions, which track the
    /// source's current native dimensions even if the device renegotiates.
    pub fn sample(&self) -> Sample {
        match self.capture.latest_frame() {
            Some(frame) => Sample::Frame(frame),
            None => Sample::Priming,
        }
    }
}

/// Owner of the single live camera stream.
///
/// `acquire` always tears the previous session down before the new device is
/// opened, so two hardware tracks are never held at once.
pub struct StreamManager {
    settings: CameraSettings,
    active: Option<StreamSession>,
}

impl StreamManager {
    /// Create a manager with the requested capture settings. The device
    /// index in `settings` is ignored; it is supplied per `acquire` call.
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            active: None,
        }
    }

    /// Acquire a stream for the given device identifier.
    ///
    /// Any prior session is released first; this ordering is mandatory so
    /// that two camera locks are never held simultaneously. The future
    /// resolves only once the source reports its native dimensions with the
    /// stream open and producing.
    ///
    /// The identifier is a previously enumerated device index; anything else
    /// fails with `AcquisitionError::InvalidDevice`.
    pub async fn acquire(&mut self, device_id: &str) -> Result<(), AcquisitionError> {
        // Stop the previous hardware track before requesting the new one.
        self.release();

        let index: u32 = device_id
            .parse()
            .map_err(|_| AcquisitionError::InvalidDevice(device_id.to_string()))?;

        let settings = CameraSettings {
            device_index: index,
            ..self.settings.clone()
        };

        // Opening and starting the camera blocks on the capture thread's
        // readiness report, so it runs on the blocking pool.
        let capture = tokio::task::spawn_blocking(move || -> Result<CameraCapture, AcquisitionError> {
            let mut capture = CameraCapture::open(settings)?;
            capture.start()?;
            Ok(capture)
        })
        .await
        .map_err(|e| AcquisitionError::StreamFailed(e.to_string()))??;

        let resolution = capture.actual_resolution().ok_or_else(|| {
            AcquisitionError::StreamFailed("camera did not report its resolution".to_string())
        })?;

        log::info!(
            "Acquired camera '{}' at {}x{}",
            device_id,
            resolution.width,
            resolution.height
        );

        self.active = Some(StreamSession {
            device_id: device_id.to_string(),
            capture,
            resolution,
        });

        Ok(())
    }

    /// Stop the active session's hardware track and clear the session.
    ///
    /// Safe to call when no session is active (no-op).
    pub fn release(&mut self) {
        if let Some(mut session) = self.active.take() {
            log::debug!("Releasing camera '{}'", session.device_id);
            session.capture.stop();
        }
    }

    /// The active session, if a stream is live.
    pub fn session(&self) -> Option<&StreamSession> {
        self.active.as_ref()
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.release();
    }
}
