//! JPEG data-URI encoding for frame payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;

use crate::camera::Frame;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("frame buffer does not match its dimensions")]
    MalformedFrame,
    #[error("JPEG encoding failed: {0}")]
    Jpeg(String),
}

/// Encode an RGB frame as a `data:image/jpeg;base64,...` URI.
pub fn frame_to_data_uri(frame: &Frame, quality: u8) -> Result<String, EncodeError> {
    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or(EncodeError::MalformedFrame)?;

    let mut buffer = Vec::new();
    let quality = quality.clamp(1, 100);
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .encode_image(&image)
        .map_err(|e| EncodeError::Jpeg(e.to_string()))?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&buffer)))
}
