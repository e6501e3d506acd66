//! Target-landmark selection and normalization.

use crate::camera::Frame;

use super::estimator::{InferenceError, PoseEstimator};
use super::types::{Keypoint, KeypointName, NormalizedPoint, Pose};

/// Minimum confidence a candidate must strictly exceed to be usable.
pub const SCORE_THRESHOLD: f32 = 0.3;

/// The bilateral candidate pair the extractor picks between.
pub const TARGET_CANDIDATES: (KeypointName, KeypointName) =
    (KeypointName::LeftAnkle, KeypointName::RightAnkle);

/// Pick the target keypoint from a pose.
///
/// Tie-break rule: the candidate with the strictly higher confidence wins;
/// on an exact tie the second candidate is taken. Returns `None` when the
/// winner does not score above [`SCORE_THRESHOLD`] - no usable landmark this
/// tick, which is not an error.
pub fn select_candidate(
    pose: &Pose,
    candidates: (KeypointName, KeypointName),
) -> Option<&Keypoint> {
    let first = pose.keypoint(candidates.0);
    let second = pose.keypoint(candidates.1);

    let chosen = match (first, second) {
        (Some(a), Some(b)) => {
            if a.score > b.score {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };

    (chosen.score > SCORE_THRESHOLD).then_some(chosen)
}

/// Normalize a keypoint to the frame's dimensions.
///
/// The result is left unclamped: estimates outside the visible frame yield
/// coordinates outside [0, 1] and are passed through as-is.
pub fn normalize(keypoint: &Keypoint, width: u32, height: u32) -> NormalizedPoint {
    NormalizedPoint {
        x: keypoint.x / width as f32,
        y: keypoint.y / height as f32,
    }
}

/// Run inference on a frame and extract the normalized target landmark.
///
/// Only the first detected pose is considered. `Ok(None)` means no pose or
/// no sufficiently confident candidate this tick.
pub async fn extract(
    estimator: &dyn PoseEstimator,
    frame: &Frame,
    candidates: (KeypointName, KeypointName),
) -> Result<Option<NormalizedPoint>, InferenceError> {
    let poses = estimator.estimate(frame).await?;
    let Some(pose) = poses.first() else {
        return Ok(None);
    };
    Ok(select_candidate(pose, candidates).map(|kp| normalize(kp, frame.width, frame.height)))
}
