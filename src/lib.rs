pub mod core;
pub mod models;
pub mod platform;

pub use crate::core::config::{ConfigError, CounterConfig};
pub use crate::core::control_loop::ControlLoop;
pub use crate::core::frame_bridge::{FrameBridge, FramePublisher, FrameReader};
pub use crate::core::geometry::{angle_at, angle_at_3d, GeometryError, Point2D, Point3D};
pub use crate::core::rep_counter::{JointSelection, RepCounter, RepThresholds};
pub use crate::core::session_manager::{CounterError, CounterResult, SessionHandle, WorkoutSessions};
pub use crate::models::pose::{AngleSample, BodyLandmark, Landmark, LandmarkFrame, PoseConfig, PoseError};
pub use crate::models::repetition::{
    DropReason, Phase, RepEvent, RepSummary, RepetitionState, SampleOutcome, TickOutcome, TickReport,
};
pub use crate::platform::pose::{BridgedPoseSource, PoseCapability, PoseSource, UnavailablePoseSource};

/// Initialize the pose module once and build the session manager around it.
///
/// A source that fails to initialize does not fail this call; the returned
/// manager reports `is_pose_available() == false` and refuses new sessions.
pub fn init_counter(source: Box<dyn PoseSource>, config: CounterConfig) -> CounterResult<WorkoutSessions> {
    let capability = PoseCapability::detect(source);
    WorkoutSessions::new(capability, config)
}
