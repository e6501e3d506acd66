//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Camera resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// A captured camera frame.
///
/// Pixel data is tightly packed RGB8. A frame is a snapshot taken from the
/// capture thread's latest-frame buffer and is only valid for the tick that
/// sampled it; its dimensions always describe this buffer, which may differ
/// from the session's initial resolution if the device renegotiates.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp when the frame was captured
    pub timestamp: Instant,
}

/// Settings used when opening a camera stream.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub device_index: u32,
    /// Requested resolution (actual may vary)
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::default(),
            fps: 30,
        }
    }
}

/// Errors that can occur while acquiring or running a camera stream.
///
/// Acquisition failures abort the current start attempt and are reported
/// upward; they are never retried automatically.
#[derive(Debug)]
pub enum AcquisitionError {
    /// Failed to query camera devices
    QueryFailed(String),
    /// The device identifier is not one the enumerator could have produced
    InvalidDevice(String),
    /// Camera device not found for the given identifier
    DeviceNotFound(String),
    /// Camera permission denied
    PermissionDenied,
    /// Failed to open the camera (covers device-busy)
    OpenFailed(String),
    /// Failed to start or keep the video stream running
    StreamFailed(String),
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::QueryFailed(msg) => write!(f, "Failed to query cameras: {}", msg),
            AcquisitionError::InvalidDevice(id) => {
                write!(f, "'{}' is not a valid camera identifier", id)
            }
            AcquisitionError::DeviceNotFound(id) => {
                write!(
                    f,
                    "Camera '{}' not found. Run 'list-cameras' to see available devices",
                    id
                )
            }
            AcquisitionError::PermissionDenied => {
                write!(
                    f,
                    "Camera permission denied. On macOS, grant access in System Settings > Privacy & Security > Camera"
                )
            }
            AcquisitionError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            AcquisitionError::StreamFailed(msg) => {
                write!(f, "Failed to start camera stream: {}", msg)
            }
        }
    }
}

impl std::error::Error for AcquisitionError {}
