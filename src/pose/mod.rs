//! Pose estimation: landmark types, the opaque detector capability, and
//! target-landmark extraction.

mod estimator;
mod extract;
mod loader;
#[cfg(feature = "onnx")]
mod movenet;
mod types;

pub use estimator::{InferenceError, PoseEstimator, SharedEstimator};
pub use extract::{extract, normalize, select_candidate, SCORE_THRESHOLD, TARGET_CANDIDATES};
pub use loader::{CapabilityInitError, DetectorLoader};
#[cfg(feature = "onnx")]
pub use movenet::MoveNetEstimator;
pub use types::{Keypoint, KeypointName, NormalizedPoint, Pose};
