// Pose estimation platform integration
// Provides the pose source contract and capability detection

pub mod pose_source;

pub use pose_source::{BridgedPoseSource, PoseCapability, PoseSource, UnavailablePoseSource};
