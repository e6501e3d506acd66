//! Landmark types produced by the pose-estimation capability.

use serde::Serialize;

/// The fixed 17-landmark topology used by single-person pose models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeypointName {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointName {
    /// Number of landmarks in the topology.
    pub const COUNT: usize = 17;

    /// All landmark names in topology order.
    pub const ALL: [KeypointName; Self::COUNT] = [
        KeypointName::Nose,
        KeypointName::LeftEye,
        KeypointName::RightEye,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
    ];

    /// Look up a landmark by its topology index.
    pub fn from_index(index: usize) -> Option<KeypointName> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEye => "left_eye",
            KeypointName::RightEye => "right_eye",
            KeypointName::LeftEar => "left_ear",
            KeypointName::RightEar => "right_ear",
            KeypointName::LeftShoulder => "left_shoulder",
            KeypointName::RightShoulder => "right_shoulder",
            KeypointName::LeftElbow => "left_elbow",
            KeypointName::RightElbow => "right_elbow",
            KeypointName::LeftWrist => "left_wrist",
            KeypointName::RightWrist => "right_wrist",
            KeypointName::LeftHip => "left_hip",
            KeypointName::RightHip => "right_hip",
            KeypointName::LeftKnee => "left_knee",
            KeypointName::RightKnee => "right_knee",
            KeypointName::LeftAnkle => "left_ankle",
            KeypointName::RightAnkle => "right_ankle",
        }
    }
}

/// A named landmark with pixel position and detection confidence.
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub name: KeypointName,
    /// X position in frame-pixel space
    pub x: f32,
    /// Y position in frame-pixel space
    pub y: f32,
    /// Detection confidence in [0, 1]
    pub score: f32,
}

/// One detected pose: an ordered fixed-size sequence of keypoints, one per
/// landmark name. Produced fresh per inference call, never retained.
#[derive(Debug, Clone)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    /// Look up a keypoint by landmark name.
    pub fn keypoint(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|k| k.name == name)
    }
}

/// A landmark position relative to the current frame dimensions.
///
/// Coordinates are deliberately unclamped: an estimate lying outside the
/// visible frame produces values outside [0, 1] and is passed through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}
