use crate::core::config::{ConfigError, CounterConfig};
use crate::core::rep_counter::RepCounter;
use crate::models::repetition::{
    DropReason, RepSummary, SampleOutcome, TickOutcome, TickReport,
};
use crate::platform::pose::PoseCapability;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, trace};
use uuid::Uuid;

// ==============================================================================
// Errors
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("Session misuse: session {0} has ended or was never started")]
    SessionMisuse(Uuid),

    #[error("Pose tracking unavailable: {0}")]
    PoseUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Control loop failed: {0}")]
    ControlLoop(String),
}

pub type CounterResult<T> = Result<T, CounterError>;

// ==============================================================================
// Session Types
// ==============================================================================

/// Opaque reference to one exercise session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle {
    id: Uuid,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

struct ActiveSession {
    counter: RepCounter,
    started_at: i64,
    last_frame_timestamp: Option<i64>,
}

// ==============================================================================
// Workout Sessions
// ==============================================================================

/// Owns the pose capability and the per-session repetition state.
///
/// Ticks take `&mut self`, so one session can never be advanced from two
/// callers at once; hosts sharing this across tasks wrap it in a mutex.
pub struct WorkoutSessions {
    capability: PoseCapability,
    config: CounterConfig,
    sessions: HashMap<Uuid, ActiveSession>,
}

impl WorkoutSessions {
    pub fn new(capability: PoseCapability, config: CounterConfig) -> CounterResult<Self> {
        config.validate()?;

        Ok(Self {
            capability,
            config,
            sessions: HashMap::new(),
        })
    }

    pub fn is_pose_available(&self) -> bool {
        self.capability.is_available()
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Start counting a new exercise session from zero
    pub fn start_session(&mut self) -> CounterResult<SessionHandle> {
        if let PoseCapability::Unavailable { reason } = &self.capability {
            return Err(CounterError::PoseUnavailable(reason.clone()));
        }

        let id = Uuid::new_v4();
        let session = ActiveSession {
            counter: RepCounter::new(self.config.thresholds(), self.config.joint),
            started_at: chrono::Utc::now().timestamp_millis(),
            last_frame_timestamp: None,
        };
        self.sessions.insert(id, session);

        info!(session_id = %id, "Started exercise session");
        Ok(SessionHandle { id })
    }

    /// Poll the latest pose result once and advance the session's counter.
    ///
    /// Missing, repeated, low-confidence and degenerate frames are reported in
    /// the tick outcome and never raised; only a dead handle is an error.
    pub fn on_control_tick(&mut self, handle: &SessionHandle) -> CounterResult<TickReport> {
        let session = self
            .sessions
            .get_mut(&handle.id)
            .ok_or(CounterError::SessionMisuse(handle.id))?;

        let latest = self
            .capability
            .source()
            .and_then(|source| source.poll_latest_result());

        let outcome = match latest {
            None => {
                // Capture stopped or restarted; its next frame is new whatever its timestamp
                session.last_frame_timestamp = None;
                TickOutcome::Sample(SampleOutcome::Dropped(DropReason::NoData))
            }
            Some(frame) if session.last_frame_timestamp == Some(frame.timestamp_ms) => {
                trace!(timestamp_ms = frame.timestamp_ms, "No new pose frame since last tick");
                TickOutcome::StaleFrame
            }
            Some(frame) => {
                session.last_frame_timestamp = Some(frame.timestamp_ms);
                TickOutcome::Sample(session.counter.process_frame(&frame))
            }
        };

        let state = session.counter.state();
        Ok(TickReport {
            session_id: handle.id,
            phase: state.phase,
            rep_count: state.rep_count,
            last_valid_angle: state.last_valid_angle,
            outcome,
        })
    }

    /// Release the session's state and return its final tally
    pub fn end_session(&mut self, handle: &SessionHandle) -> CounterResult<RepSummary> {
        let session = self
            .sessions
            .remove(&handle.id)
            .ok_or(CounterError::SessionMisuse(handle.id))?;

        let summary = RepSummary {
            session_id: handle.id,
            rep_count: session.counter.rep_count(),
            started_at: session.started_at,
            ended_at: chrono::Utc::now().timestamp_millis(),
        };

        info!(
            session_id = %handle.id,
            rep_count = summary.rep_count,
            duration_ms = summary.duration_ms(),
            "Ended exercise session"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame_bridge::FramePublisher;
    use crate::core::rep_counter::tests::arm_frame;
    use crate::models::pose::PoseConfig;
    use crate::models::repetition::Phase;
    use crate::platform::pose::{BridgedPoseSource, UnavailablePoseSource};

    fn bridged_sessions() -> (WorkoutSessions, FramePublisher) {
        let (source, publisher) = BridgedPoseSource::new(PoseConfig::default());
        let capability = PoseCapability::detect(Box::new(source));
        let sessions = WorkoutSessions::new(capability, CounterConfig::default()).unwrap();
        publisher.set_ready(true);
        (sessions, publisher)
    }

    #[test]
    fn test_start_session_requires_pose_capability() {
        let capability = PoseCapability::detect(Box::new(UnavailablePoseSource::default()));
        let mut sessions = WorkoutSessions::new(capability, CounterConfig::default()).unwrap();

        assert!(!sessions.is_pose_available());
        assert!(matches!(
            sessions.start_session(),
            Err(CounterError::PoseUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (source, _publisher) = BridgedPoseSource::new(PoseConfig::default());
        let capability = PoseCapability::detect(Box::new(source));
        let config = CounterConfig {
            bottom_threshold_deg: 170.0,
            ..CounterConfig::default()
        };

        assert!(matches!(
            WorkoutSessions::new(capability, config),
            Err(CounterError::Config(_))
        ));
    }

    #[test]
    fn test_tick_without_frames_reports_no_data() {
        let (mut sessions, _publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        let report = sessions.on_control_tick(&handle).unwrap();
        assert_eq!(
            report.outcome,
            TickOutcome::Sample(SampleOutcome::Dropped(DropReason::NoData))
        );
        assert_eq!(report.phase, Phase::Top);
        assert_eq!(report.rep_count, 0);
        assert!(report.last_valid_angle.is_none());
    }

    #[test]
    fn test_ticks_count_a_repetition() {
        let (mut sessions, publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        let mut completed = 0;
        for (i, angle) in [170.0, 150.0, 120.0, 85.0, 70.0, 95.0, 130.0, 165.0]
            .into_iter()
            .enumerate()
        {
            publisher.publish(arm_frame(angle, i as i64 * 200, 0.9));
            let report = sessions.on_control_tick(&handle).unwrap();
            if report.rep_completed() {
                completed += 1;
            }
        }

        let report = sessions.on_control_tick(&handle).unwrap();
        assert_eq!(completed, 1);
        assert_eq!(report.rep_count, 1);
        assert_eq!(report.phase, Phase::Top);
        assert!(report.last_valid_angle.unwrap() > 160.0);
    }

    #[test]
    fn test_repeated_frame_is_processed_once() {
        let (mut sessions, publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        publisher.publish(arm_frame(150.0, 1_000, 0.9));
        let first = sessions.on_control_tick(&handle).unwrap();
        let second = sessions.on_control_tick(&handle).unwrap();

        assert_eq!(
            first.outcome,
            TickOutcome::Sample(SampleOutcome::Transitioned(Phase::Descending))
        );
        assert_eq!(second.outcome, TickOutcome::StaleFrame);
        assert_eq!(second.phase, Phase::Descending);
    }

    #[test]
    fn test_restarted_capture_frame_is_not_stale() {
        let (mut sessions, publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        publisher.publish(arm_frame(150.0, 1_000, 0.9));
        sessions.on_control_tick(&handle).unwrap();

        publisher.clear();
        let report = sessions.on_control_tick(&handle).unwrap();
        assert_eq!(
            report.outcome,
            TickOutcome::Sample(SampleOutcome::Dropped(DropReason::NoData))
        );

        // New capture whose clock lands on the same timestamp
        publisher.publish(arm_frame(80.0, 1_000, 0.9));
        let report = sessions.on_control_tick(&handle).unwrap();
        assert_eq!(
            report.outcome,
            TickOutcome::Sample(SampleOutcome::Transitioned(Phase::Bottom))
        );
    }

    #[test]
    fn test_low_confidence_tick_keeps_state() {
        let (mut sessions, publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        publisher.publish(arm_frame(60.0, 1_000, 0.2));
        let report = sessions.on_control_tick(&handle).unwrap();

        assert_eq!(
            report.outcome,
            TickOutcome::Sample(SampleOutcome::Dropped(DropReason::LowConfidence))
        );
        assert_eq!(report.phase, Phase::Top);
    }

    #[test]
    fn test_producer_not_ready_reports_no_data() {
        let (mut sessions, publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        publisher.publish(arm_frame(150.0, 1_000, 0.9));
        publisher.set_ready(false);

        let report = sessions.on_control_tick(&handle).unwrap();
        assert_eq!(
            report.outcome,
            TickOutcome::Sample(SampleOutcome::Dropped(DropReason::NoData))
        );
    }

    #[test]
    fn test_tick_after_end_is_session_misuse() {
        let (mut sessions, _publisher) = bridged_sessions();
        let handle = sessions.start_session().unwrap();

        let summary = sessions.end_session(&handle).unwrap();
        assert_eq!(summary.session_id, handle.id());
        assert_eq!(summary.rep_count, 0);
        assert_eq!(sessions.active_sessions(), 0);

        match sessions.on_control_tick(&handle) {
            Err(CounterError::SessionMisuse(id)) => assert_eq!(id, handle.id()),
            other => panic!("expected session misuse, got {:?}", other),
        }
        assert!(matches!(
            sessions.end_session(&handle),
            Err(CounterError::SessionMisuse(_))
        ));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let (mut sessions, publisher) = bridged_sessions();
        let first = sessions.start_session().unwrap();
        publisher.publish(arm_frame(150.0, 1_000, 0.9));
        sessions.on_control_tick(&first).unwrap();

        let second = sessions.start_session().unwrap();
        assert_eq!(sessions.active_sessions(), 2);

        // Fresh session still sees the frame the first one already consumed
        let report = sessions.on_control_tick(&second).unwrap();
        assert_eq!(
            report.outcome,
            TickOutcome::Sample(SampleOutcome::Transitioned(Phase::Descending))
        );
    }
}
