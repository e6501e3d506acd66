//! Camera streaming module for webcam access and frame capture.
//!
//! This module provides the video-source side of the bridge:
//! - Device enumeration via [`list_devices`]
//! - Low-level capture via [`CameraCapture`]
//! - Session ownership and acquire/release ordering via [`StreamManager`]

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod manager;
mod types;

pub use capture::CameraCapture;
pub use device::list_devices;
pub use manager::{Sample, StreamManager, StreamSession};
pub use types::{AcquisitionError, CameraInfo, CameraSettings, Frame, Resolution};
