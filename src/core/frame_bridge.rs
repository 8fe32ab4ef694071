// Frame result bridge - single-slot latest-value channel between the pose
// producer (camera rate) and the control-loop consumer (fixed tick rate)

use crate::models::pose::LandmarkFrame;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

type Slot = Option<Arc<LandmarkFrame>>;

/// Producer-side status shared with every reader
#[derive(Debug, Default)]
struct BridgeStatus {
    ready: AtomicBool,
    published: AtomicU64,
}

/// Entry point for creating a bridge owned by one capture session
pub struct FrameBridge;

impl FrameBridge {
    /// Create a connected publisher/reader pair with an empty slot
    pub fn channel() -> (FramePublisher, FrameReader) {
        let (slot_tx, slot_rx) = watch::channel::<Slot>(None);
        let status = Arc::new(BridgeStatus::default());

        (
            FramePublisher {
                slot: slot_tx,
                status: status.clone(),
            },
            FrameReader {
                slot: slot_rx,
                status,
            },
        )
    }
}

// ==============================================================================
// Producer side
// ==============================================================================

/// Held by the capture context. Dropping it ends the capture session for
/// every reader.
pub struct FramePublisher {
    slot: watch::Sender<Slot>,
    status: Arc<BridgeStatus>,
}

impl FramePublisher {
    /// Replace the slot with a new frame. Readers holding the previous frame
    /// keep their snapshot; new polls see this one.
    pub fn publish(&self, frame: LandmarkFrame) {
        self.slot.send_replace(Some(Arc::new(frame)));
        self.status.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Report whether the pose pipeline is warmed up and serving results
    pub fn set_ready(&self, ready: bool) {
        self.status.ready.store(ready, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.status.ready.load(Ordering::Acquire)
    }

    /// Empty the slot, e.g. when capture stops but the publisher is reused
    pub fn clear(&self) {
        self.slot.send_replace(None);
    }
}

// ==============================================================================
// Consumer side
// ==============================================================================

/// Non-blocking view of the latest published frame
#[derive(Clone)]
pub struct FrameReader {
    slot: watch::Receiver<Slot>,
    status: Arc<BridgeStatus>,
}

impl FrameReader {
    /// Snapshot of the latest complete frame.
    ///
    /// Returns `None` when nothing was published yet, the slot was cleared,
    /// the publisher is gone, or the producer reports not-ready. Constant
    /// time; the slot lock is held only long enough to clone an `Arc`.
    pub fn poll(&self) -> Option<Arc<LandmarkFrame>> {
        if !self.producer_ready() {
            return None;
        }
        self.slot.borrow().clone()
    }

    /// True while a publisher exists and has marked the pipeline ready
    pub fn producer_ready(&self) -> bool {
        self.status.ready.load(Ordering::Acquire) && !self.producer_gone()
    }

    /// Total frames published on this bridge
    pub fn frames_published(&self) -> u64 {
        self.status.published.load(Ordering::Relaxed)
    }

    fn producer_gone(&self) -> bool {
        self.slot.has_changed().is_err()
    }
}
