//! The opaque pose-estimation capability boundary.

use std::sync::Arc;

use async_trait::async_trait;

use crate::camera::Frame;

use super::types::Pose;

/// An inference-engine fault. Treated by the detection loop as a one-tick
/// skip, never a fatal abort.
#[derive(Debug, thiserror::Error)]
#[error("pose inference failed: {0}")]
pub struct InferenceError(pub String);

/// The pose-estimation capability: given an image, return zero or more
/// poses. Internals are opaque to the rest of the crate.
#[async_trait]
pub trait PoseEstimator: Send + Sync {
    /// Run inference on one frame. May suspend.
    async fn estimate(&self, frame: &Frame) -> Result<Vec<Pose>, InferenceError>;
}

/// Shared handle to an initialized capability, cached for the process
/// lifetime by the loader.
pub type SharedEstimator = Arc<dyn PoseEstimator>;
