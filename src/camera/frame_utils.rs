//! Frame conversion helpers for the capture thread.

use std::time::Instant;

use nokhwa::pixel_format::RgbFormat;

use super::types::Frame;

/// Convert a nokhwa buffer to our RGB [`Frame`] format.
///
/// Handles the camera's native format (MJPEG, YUYV, NV12, etc.) by using
/// nokhwa's built-in decode which converts to RGB.
///
/// Returns `None` if the conversion fails (unsupported format or corrupt
/// data); the caller skips that frame and tries the next one.
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame {
        data: decoded.into_raw(),
        width: resolution.width(),
        height: resolution.height(),
        timestamp: Instant::now(),
    })
}
