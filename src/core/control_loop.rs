// Fixed-interval control loop driving one exercise session, decoupled from
// the camera frame rate

use crate::core::session_manager::{CounterError, CounterResult, SessionHandle, WorkoutSessions};
use crate::models::repetition::{RepEvent, RepSummary, TickReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub struct ControlLoop {
    event_tx: broadcast::Sender<RepEvent>,
    report_rx: watch::Receiver<Option<TickReport>>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<CounterResult<RepSummary>>,
}

impl ControlLoop {
    /// Spawn a loop ticking `handle` every `tick_interval` until shut down.
    /// Must be called inside a tokio runtime.
    pub fn spawn(
        sessions: Arc<Mutex<WorkoutSessions>>,
        handle: SessionHandle,
        tick_interval: Duration,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(16);
        let (report_tx, report_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(Self::run(
            sessions,
            handle,
            tick_interval,
            event_tx.clone(),
            report_tx,
            shutdown_rx,
        ));

        Self {
            event_tx,
            report_rx,
            shutdown_tx,
            task,
        }
    }

    /// Subscribe to counted repetitions
    pub fn subscribe(&self) -> broadcast::Receiver<RepEvent> {
        self.event_tx.subscribe()
    }

    /// Most recent tick report, for UI polling
    pub fn latest_report(&self) -> Option<TickReport> {
        self.report_rx.borrow().clone()
    }

    /// Stop ticking, end the session and return its summary
    pub async fn shutdown(self) -> CounterResult<RepSummary> {
        // The task may already have exited on its own error
        let _ = self.shutdown_tx.send(true);

        self.task
            .await
            .map_err(|e| CounterError::ControlLoop(e.to_string()))?
    }

    async fn run(
        sessions: Arc<Mutex<WorkoutSessions>>,
        handle: SessionHandle,
        tick_interval: Duration,
        event_tx: broadcast::Sender<RepEvent>,
        report_tx: watch::Sender<Option<TickReport>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> CounterResult<RepSummary> {
        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            session_id = %handle.id(),
            tick_ms = tick_interval.as_millis() as u64,
            "Control loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = sessions.lock().await.on_control_tick(&handle)?;

                    if report.rep_completed() {
                        let event = RepEvent {
                            session_id: report.session_id,
                            rep_count: report.rep_count,
                            timestamp_ms: chrono::Utc::now().timestamp_millis(),
                        };
                        // No subscribers is fine
                        let _ = event_tx.send(event);
                    }

                    report_tx.send_replace(Some(report));
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!(session_id = %handle.id(), "Control loop shutdown requested");
                        break;
                    }
                }
            }
        }

        sessions.lock().await.end_session(&handle)
    }
}
