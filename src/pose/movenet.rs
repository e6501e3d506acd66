//! MoveNet single-pose estimator backed by ONNX Runtime.
//!
//! Compiled only with the `onnx` feature. The model output layout is
//! `[1, 1, 17, 3]` with `(y, x, score)` per landmark, coordinates relative
//! to the input image; they are mapped back to frame-pixel space here.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::camera::Frame;

use super::estimator::{InferenceError, PoseEstimator};
use super::loader::CapabilityInitError;
use super::types::{Keypoint, KeypointName, Pose};

/// Model input edge length in pixels.
const INPUT_SIZE: u32 = 256;

pub struct MoveNetEstimator {
    session: Arc<Mutex<Session>>,
}

impl MoveNetEstimator {
    /// Load model weights and prepare the inference session.
    pub fn load(path: &Path) -> Result<Self, CapabilityInitError> {
        let session = Session::builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| CapabilityInitError::ModelLoadFailed(e.to_string()))?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
        })
    }
}

#[async_trait]
impl PoseEstimator for MoveNetEstimator {
    async fn estimate(&self, frame: &Frame) -> Result<Vec<Pose>, InferenceError> {
        let input = preprocess(frame)?;
        let (width, height) = (frame.width, frame.height);
        let session = Arc::clone(&self.session);

        tokio::task::spawn_blocking(move || run_inference(&session, input, width, height))
            .await
            .map_err(|e| InferenceError(e.to_string()))?
    }
}

/// Resize the RGB frame to the model's square input.
fn preprocess(frame: &Frame) -> Result<Array4<f32>, InferenceError> {
    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| InferenceError("frame buffer does not match its dimensions".to_string()))?;
    let resized = image::imageops::resize(
        &image,
        INPUT_SIZE,
        INPUT_SIZE,
        image::imageops::FilterType::Triangle,
    );

    let size = INPUT_SIZE as usize;
    let mut input = Array4::<f32>::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for channel in 0..3 {
            input[[0, y as usize, x as usize, channel]] = pixel[channel] as f32;
        }
    }
    Ok(input)
}

fn run_inference(
    session: &Mutex<Session>,
    input: Array4<f32>,
    frame_width: u32,
    frame_height: u32,
) -> Result<Vec<Pose>, InferenceError> {
    let input_tensor = Tensor::from_array(input).map_err(|e| InferenceError(e.to_string()))?;

    let mut session = session
        .lock()
        .map_err(|_| InferenceError("inference session lock poisoned".to_string()))?;
    let outputs = session
        .run(ort::inputs!["serving_default_input_0" => input_tensor])
        .map_err(|e| InferenceError(e.to_string()))?;
    let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
        .try_extract_array()
        .map_err(|e| InferenceError(e.to_string()))?;

    let mut keypoints = Vec::with_capacity(KeypointName::COUNT);
    for (i, name) in KeypointName::ALL.iter().enumerate() {
        let y = output[[0, 0, i, 0]];
        let x = output[[0, 0, i, 1]];
        let score = output[[0, 0, i, 2]];
        keypoints.push(Keypoint {
            name: *name,
            x: x * frame_width as f32,
            y: y * frame_height as f32,
            score,
        });
    }

    Ok(vec![Pose { keypoints }])
}
