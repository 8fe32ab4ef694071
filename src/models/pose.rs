// Data models for body pose landmarks produced by the external pose model

use serde::{Deserialize, Serialize, Serializer};

// ==============================================================================
// Body Landmarks (33 keypoints)
// ==============================================================================

/// Number of landmarks in one body pose frame
pub const BODY_LANDMARK_COUNT: usize = 33;

/// Values per landmark in a flat buffer: x, y, z, confidence
pub const LANDMARK_STRIDE: usize = 4;

/// MediaPipe Pose landmark indices (33 total)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BodyLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl BodyLandmark {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A single tracked body point with confidence score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,          // Normalized [0, 1] in image space
    pub y: f32,          // Normalized [0, 1] in image space
    pub z: f32,          // Relative depth, sign convention fixed by the model
    pub confidence: f32, // Visibility/likelihood [0, 1]
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            z,
            confidence,
        }
    }

    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

// ==============================================================================
// Landmark Frame (one pose-detection outcome)
// ==============================================================================

/// Complete body pose for a single camera frame.
///
/// Built in one piece and never mutated afterwards, so a consumer that holds
/// a frame always sees every landmark from the same detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkFrame {
    #[serde(serialize_with = "serialize_landmarks")]
    landmarks: Box<[Landmark; BODY_LANDMARK_COUNT]>,
    pub width: u32,
    pub height: u32,
    pub timestamp_ms: i64,
}

impl LandmarkFrame {
    pub fn new(
        landmarks: [Landmark; BODY_LANDMARK_COUNT],
        width: u32,
        height: u32,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            landmarks: Box::new(landmarks),
            width,
            height,
            timestamp_ms,
        }
    }

    /// Build a frame from a flat `[x, y, z, confidence]` buffer as handed over
    /// by native pose modules
    pub fn from_flat(data: &[f32], width: u32, height: u32, timestamp_ms: i64) -> PoseResult<Self> {
        let expected = BODY_LANDMARK_COUNT * LANDMARK_STRIDE;
        if data.len() != expected {
            return Err(PoseError::InvalidFrame(format!(
                "expected {} values ({} landmarks x {}), got {}",
                expected,
                BODY_LANDMARK_COUNT,
                LANDMARK_STRIDE,
                data.len()
            )));
        }

        let mut landmarks = Box::new([Landmark::default(); BODY_LANDMARK_COUNT]);
        for (slot, c) in landmarks.iter_mut().zip(data.chunks_exact(LANDMARK_STRIDE)) {
            *slot = Landmark::new(c[0], c[1], c[2], c[3]);
        }

        Ok(Self {
            landmarks,
            width,
            height,
            timestamp_ms,
        })
    }

    pub fn landmark(&self, part: BodyLandmark) -> Landmark {
        self.landmarks[part.index()]
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks[..]
    }
}

// serde only derives arrays up to 32 elements
fn serialize_landmarks<S>(
    landmarks: &[Landmark; BODY_LANDMARK_COUNT],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(landmarks.iter())
}

// ==============================================================================
// Angle Sample
// ==============================================================================

/// Joint angle derived from three landmarks of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub angle_degrees: f32, // [0, 180]
    pub source_frame_timestamp: i64,
}

impl AngleSample {
    pub fn new(angle_degrees: f32, source_frame_timestamp: i64) -> Self {
        Self {
            angle_degrees,
            source_frame_timestamp,
        }
    }
}

// ==============================================================================
// Configuration
// ==============================================================================

/// Settings handed to the external pose model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    pub target_fps: u32,               // Frames per second the producer aims for (default: 30)
    pub min_detection_confidence: f32, // Minimum confidence for detection (default: 0.5)
    pub min_tracking_confidence: f32,  // Minimum confidence for tracking (default: 0.5)
    pub model_complexity: ModelComplexity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelComplexity {
    Lite = 0,  // Fastest, less accurate
    Full = 1,  // Balanced
    Heavy = 2, // Slowest, most accurate
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            model_complexity: ModelComplexity::Full,
        }
    }
}

impl PoseConfig {
    /// Interval between producer frames at the target rate
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / u64::from(self.target_fps.max(1)))
    }
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PoseError {
    #[error("Pose source not supported on this platform")]
    NotSupported,

    #[error("Pose source initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Invalid landmark frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type PoseResult<T> = Result<T, PoseError>;
