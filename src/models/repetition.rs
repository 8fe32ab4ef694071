// Data models for repetition counting sessions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// Phase & State
// ==============================================================================

/// Range-of-motion phase of one repetition cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Top,
    Descending,
    Bottom,
    Ascending,
}

impl Phase {
    pub fn to_string(&self) -> &'static str {
        match self {
            Phase::Top => "top",
            Phase::Descending => "descending",
            Phase::Bottom => "bottom",
            Phase::Ascending => "ascending",
        }
    }
}

/// Mutable counting state owned by exactly one state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionState {
    pub phase: Phase,
    pub rep_count: u32,
    pub last_transition_timestamp: Option<i64>,
    pub last_valid_angle: Option<f32>,
}

impl Default for RepetitionState {
    fn default() -> Self {
        Self {
            phase: Phase::Top,
            rep_count: 0,
            last_transition_timestamp: None,
            last_valid_angle: None,
        }
    }
}

// ==============================================================================
// Sample Outcomes
// ==============================================================================

/// Why a sample was discarded without touching the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    DegenerateGeometry,
    LowConfidence,
    NoData,
}

impl DropReason {
    pub fn to_string(&self) -> &'static str {
        match self {
            DropReason::DegenerateGeometry => "degenerate_geometry",
            DropReason::LowConfidence => "low_confidence",
            DropReason::NoData => "no_data",
        }
    }
}

/// Result of feeding one sample to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleOutcome {
    /// Sample discarded, state unchanged
    Dropped(DropReason),
    /// Accepted, no threshold crossed
    Idle,
    /// Accepted and moved to a new phase
    Transitioned(Phase),
    /// Completed a repetition; carries the new count
    RepCounted(u32),
}

/// What one control tick did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// The latest frame was already processed on an earlier tick
    StaleFrame,
    Sample(SampleOutcome),
}

// ==============================================================================
// Host-facing reports
// ==============================================================================

/// Snapshot returned to the host after every control tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub session_id: Uuid,
    pub phase: Phase,
    pub rep_count: u32,
    pub last_valid_angle: Option<f32>,
    pub outcome: TickOutcome,
}

impl TickReport {
    pub fn rep_completed(&self) -> bool {
        matches!(
            self.outcome,
            TickOutcome::Sample(SampleOutcome::RepCounted(_))
        )
    }
}

/// Application event emitted when a repetition is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepEvent {
    pub session_id: Uuid,
    pub rep_count: u32,
    pub timestamp_ms: i64,
}

/// Final tally handed back when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepSummary {
    pub session_id: Uuid,
    pub rep_count: u32,
    pub started_at: i64,
    pub ended_at: i64,
}

impl RepSummary {
    pub fn duration_ms(&self) -> i64 {
        (self.ended_at - self.started_at).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = RepetitionState::default();
        assert_eq!(state.phase, Phase::Top);
        assert_eq!(state.rep_count, 0);
        assert!(state.last_valid_angle.is_none());
        assert!(state.last_transition_timestamp.is_none());
    }

    #[test]
    fn test_tick_report_rep_completed() {
        let mut report = TickReport {
            session_id: Uuid::new_v4(),
            phase: Phase::Top,
            rep_count: 1,
            last_valid_angle: Some(165.0),
            outcome: TickOutcome::Sample(SampleOutcome::RepCounted(1)),
        };
        assert!(report.rep_completed());

        report.outcome = TickOutcome::Sample(SampleOutcome::Dropped(DropReason::NoData));
        assert!(!report.rep_completed());
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RepSummary {
            session_id: Uuid::new_v4(),
            rep_count: 12,
            started_at: 1_000,
            ended_at: 61_000,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let decoded: RepSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, summary);
        assert_eq!(decoded.duration_ms(), 60_000);
    }
}
