// Repetition state machine - turns a stream of elbow angles into counted reps
// using a hysteresis band between two thresholds plus a refractory period

use crate::core::geometry::{angle_at, Point2D};
use crate::models::pose::{AngleSample, BodyLandmark, LandmarkFrame};
use crate::models::repetition::{DropReason, Phase, RepetitionState, SampleOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, trace};

const LEFT_ARM: [BodyLandmark; 3] = [
    BodyLandmark::LeftShoulder,
    BodyLandmark::LeftElbow,
    BodyLandmark::LeftWrist,
];

const RIGHT_ARM: [BodyLandmark; 3] = [
    BodyLandmark::RightShoulder,
    BodyLandmark::RightElbow,
    BodyLandmark::RightWrist,
];

/// Which arm's shoulder-elbow-wrist angle drives the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointSelection {
    Left,
    Right,
    /// Per frame, the arm whose least confident landmark is most confident
    Auto,
}

impl JointSelection {
    fn candidates(self) -> &'static [[BodyLandmark; 3]] {
        match self {
            JointSelection::Left => &[LEFT_ARM],
            JointSelection::Right => &[RIGHT_ARM],
            JointSelection::Auto => &[LEFT_ARM, RIGHT_ARM],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepThresholds {
    /// Angle at or above which the arm is extended
    pub top_deg: f32,
    /// Angle at or below which the arm is flexed
    pub bottom_deg: f32,
    /// Minimum spacing between counted repetitions
    pub refractory: Duration,
    /// Minimum confidence for each contributing landmark
    pub min_confidence: f32,
}

impl Default for RepThresholds {
    fn default() -> Self {
        Self {
            top_deg: 160.0,
            bottom_deg: 90.0,
            refractory: Duration::from_millis(300),
            min_confidence: 0.5,
        }
    }
}

/// Single-owner repetition counter for one exercise session
#[derive(Debug)]
pub struct RepCounter {
    thresholds: RepThresholds,
    joint: JointSelection,
    state: RepetitionState,
}

impl RepCounter {
    pub fn new(thresholds: RepThresholds, joint: JointSelection) -> Self {
        Self {
            thresholds,
            joint,
            state: RepetitionState::default(),
        }
    }

    pub fn state(&self) -> &RepetitionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    pub fn thresholds(&self) -> &RepThresholds {
        &self.thresholds
    }

    /// Back to `Top` with zero reps
    pub fn reset(&mut self) {
        self.state = RepetitionState::default();
    }

    /// Derive the elbow angle from a frame and feed it to the machine
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> SampleOutcome {
        match self.sample_from_frame(frame) {
            Ok(sample) => self.process_angle(sample),
            Err(reason) => {
                trace!(
                    timestamp_ms = frame.timestamp_ms,
                    reason = reason.to_string(),
                    "Dropped pose sample"
                );
                SampleOutcome::Dropped(reason)
            }
        }
    }

    /// Elbow angle for the configured arm, or the reason no usable angle exists
    pub fn sample_from_frame(&self, frame: &LandmarkFrame) -> Result<AngleSample, DropReason> {
        let arm = self.select_arm(frame).ok_or(DropReason::LowConfidence)?;
        let [shoulder, elbow, wrist] = arm.map(|part| frame.landmark(part));

        let angle = angle_at(
            Point2D::from(&shoulder),
            Point2D::from(&elbow),
            Point2D::from(&wrist),
        )
        .map_err(|_| DropReason::DegenerateGeometry)?;

        Ok(AngleSample::new(angle, frame.timestamp_ms))
    }

    fn select_arm(&self, frame: &LandmarkFrame) -> Option<[BodyLandmark; 3]> {
        let min_confidence = self.thresholds.min_confidence;
        let weakest = |arm: &[BodyLandmark; 3]| {
            arm.iter()
                .map(|part| frame.landmark(*part).confidence)
                .fold(f32::INFINITY, f32::min)
        };

        // is_visible fails NaN, so the fold below only sees comparable values
        self.joint
            .candidates()
            .iter()
            .filter(|arm| {
                arm.iter()
                    .all(|part| frame.landmark(*part).is_visible(min_confidence))
            })
            .map(|arm| (*arm, weakest(arm)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(arm, _)| arm)
    }

    /// Advance the machine with an already computed angle
    pub fn process_angle(&mut self, sample: AngleSample) -> SampleOutcome {
        let angle = sample.angle_degrees;
        if !angle.is_finite() {
            return SampleOutcome::Dropped(DropReason::DegenerateGeometry);
        }

        let timestamp = sample.source_frame_timestamp;
        let RepThresholds { top_deg, bottom_deg, .. } = self.thresholds;

        self.state.last_valid_angle = Some(angle);

        let next = match self.state.phase {
            Phase::Top if angle < top_deg => Phase::Descending,
            Phase::Descending if angle <= bottom_deg => Phase::Bottom,
            Phase::Bottom if angle > bottom_deg => Phase::Ascending,
            Phase::Ascending if angle >= top_deg => Phase::Top,
            _ => return SampleOutcome::Idle,
        };

        let previous = self.state.phase;
        let previous_transition = self.state.last_transition_timestamp;
        self.state.phase = next;
        self.state.last_transition_timestamp = Some(timestamp);

        if next == Phase::Top {
            if self.refractory_elapsed(previous_transition, timestamp) {
                self.state.rep_count += 1;
                info!(
                    rep_count = self.state.rep_count,
                    angle, timestamp_ms = timestamp, "Repetition counted"
                );
                return SampleOutcome::RepCounted(self.state.rep_count);
            }
            debug!(
                timestamp_ms = timestamp,
                "Cycle completed inside refractory window, not counted"
            );
        }

        debug!(
            from = previous.to_string(),
            to = next.to_string(),
            angle,
            "Phase transition"
        );
        SampleOutcome::Transitioned(next)
    }

    /// Time spent since the previous phase change must strictly exceed the
    /// refractory period
    fn refractory_elapsed(&self, previous_transition: Option<i64>, timestamp: i64) -> bool {
        match previous_transition {
            None => true,
            Some(previous) => {
                let refractory_ms =
                    i64::try_from(self.thresholds.refractory.as_millis()).unwrap_or(i64::MAX);
                timestamp.saturating_sub(previous) > refractory_ms
            }
        }
    }
}
