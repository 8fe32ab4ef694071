/// Drives a synthetic push-up motion through the full pipeline:
/// a 30 Hz producer thread publishes landmark frames while a 40 ms control
/// loop counts repetitions.
/// Run with: cargo run --example simulated_session

use repcount_lib::{
    init_counter, BodyLandmark, BridgedPoseSource, ControlLoop, CounterConfig, FramePublisher,
    Landmark, LandmarkFrame,
};
use repcount_lib::models::pose::BODY_LANDMARK_COUNT;
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tracing::Level;

const REP_PERIOD_SECS: f32 = 1.6;
const RUN_FOR: Duration = Duration::from_secs(8);

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

/// Elbow angle oscillating between roughly 75 and 175 degrees
fn elbow_angle(elapsed: f32) -> f32 {
    125.0 + 50.0 * (2.0 * PI * elapsed / REP_PERIOD_SECS).cos()
}

fn synthetic_frame(angle_deg: f32, timestamp_ms: i64) -> LandmarkFrame {
    let mut landmarks = [Landmark::new(0.5, 0.6, 0.0, 0.9); BODY_LANDMARK_COUNT];
    let theta = angle_deg.to_radians();

    let arms = [
        (BodyLandmark::LeftShoulder, BodyLandmark::LeftElbow, BodyLandmark::LeftWrist, 0.4),
        (BodyLandmark::RightShoulder, BodyLandmark::RightElbow, BodyLandmark::RightWrist, 0.6),
    ];
    for (shoulder, elbow, wrist, x) in arms {
        landmarks[shoulder.index()] = Landmark::new(x, 0.35, 0.0, 0.95);
        landmarks[elbow.index()] = Landmark::new(x, 0.5, 0.0, 0.95);
        landmarks[wrist.index()] =
            Landmark::new(x + 0.15 * theta.sin(), 0.5 - 0.15 * theta.cos(), 0.0, 0.95);
    }

    LandmarkFrame::new(landmarks, 720, 1280, timestamp_ms)
}

fn spawn_producer(
    publisher: FramePublisher,
    frame_interval: Duration,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let start = Instant::now();
        publisher.set_ready(true);

        while running.load(Ordering::Relaxed) {
            let elapsed = start.elapsed();
            let frame = synthetic_frame(elbow_angle(elapsed.as_secs_f32()), elapsed.as_millis() as i64);
            publisher.publish(frame);
            thread::sleep(frame_interval);
        }

        publisher.set_ready(false);
        publisher.clear();
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = CounterConfig::default();
    let (source, publisher) = BridgedPoseSource::new(config.pose.clone());
    let tick = config.control_tick();
    let frame_interval = config.pose.frame_interval();

    let mut sessions = init_counter(Box::new(source), config)?;
    let handle = sessions.start_session()?;
    let sessions = Arc::new(Mutex::new(sessions));

    let running = Arc::new(AtomicBool::new(true));
    let producer = spawn_producer(publisher, frame_interval, running.clone());

    let control = ControlLoop::spawn(sessions.clone(), handle, tick);
    let mut events = control.subscribe();

    println!("=== Simulated push-up session ({}s) ===\n", RUN_FOR.as_secs());

    let deadline = tokio::time::sleep(RUN_FOR);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => println!("  Rep {} counted", event.rep_count),
                Err(RecvError::Lagged(missed)) => {
                    println!("  Missed {} rep events", missed);
                }
                Err(RecvError::Closed) => {
                    println!("  Event stream closed");
                    break;
                }
            },
            _ = &mut deadline => break,
        }
    }

    let summary = control.shutdown().await?;
    running.store(false, Ordering::Relaxed);
    let _ = producer.join();

    println!("\nSession {} finished", summary.session_id);
    println!("  Repetitions: {}", summary.rep_count);
    println!("  Duration: {} ms", summary.duration_ms());
    println!(
        "  Expected about {} at {:.1}s per rep",
        (RUN_FOR.as_secs_f32() / REP_PERIOD_SECS) as u32,
        REP_PERIOD_SECS
    );

    Ok(())
}
