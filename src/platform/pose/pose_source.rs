// Pose source integration
// Abstracts the external pose-estimation module (native platform module or
// on-device model) behind the three operations the counter depends on

use crate::core::frame_bridge::{FrameBridge, FramePublisher, FrameReader};
use crate::models::pose::{LandmarkFrame, PoseConfig, PoseError, PoseResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Pose source trait
/// Implement this for each platform pose backend
pub trait PoseSource: Send {
    /// One-time setup; must succeed before any result is served
    fn initialize(&mut self) -> PoseResult<()>;

    /// Whether the per-frame pipeline is warmed up and serving results
    fn is_ready(&self) -> bool;

    /// Latest fully formed frame, or `None` when there is nothing to serve.
    /// Never blocks.
    fn poll_latest_result(&self) -> Option<Arc<LandmarkFrame>>;

    /// Get backend info
    fn model_info(&self) -> String;
}

// ==============================================================================
// Bridge-backed Implementation
// ==============================================================================

/// Pose source fed by a capture thread through a [`FrameBridge`].
///
/// The native capture module keeps the paired [`FramePublisher`]; this side
/// only ever reads the latest slot.
pub struct BridgedPoseSource {
    reader: FrameReader,
    config: PoseConfig,
    initialized: bool,
}

impl BridgedPoseSource {
    /// Create a source together with the publisher the capture thread writes to
    pub fn new(config: PoseConfig) -> (Self, FramePublisher) {
        let (publisher, reader) = FrameBridge::channel();
        let source = Self {
            reader,
            config,
            initialized: false,
        };
        (source, publisher)
    }

    pub fn frames_published(&self) -> u64 {
        self.reader.frames_published()
    }
}

impl PoseSource for BridgedPoseSource {
    fn initialize(&mut self) -> PoseResult<()> {
        if self.config.target_fps == 0 {
            return Err(PoseError::InvalidConfig(
                "target_fps must be greater than zero".to_string(),
            ));
        }

        self.initialized = true;
        info!(
            target_fps = self.config.target_fps,
            min_detection_confidence = self.config.min_detection_confidence,
            "Bridged pose source initialized"
        );
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.initialized && self.reader.producer_ready()
    }

    fn poll_latest_result(&self) -> Option<Arc<LandmarkFrame>> {
        if !self.initialized {
            return None;
        }
        self.reader.poll()
    }

    fn model_info(&self) -> String {
        format!(
            "Bridged pose source - target {} fps, {:?} model, {} frames received",
            self.config.target_fps,
            self.config.model_complexity,
            self.reader.frames_published()
        )
    }
}

// ==============================================================================
// Unavailable Implementation (platforms/builds without a pose module)
// ==============================================================================

#[derive(Debug, Default)]
pub struct UnavailablePoseSource {
    reason: Option<String>,
}

impl UnavailablePoseSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

impl PoseSource for UnavailablePoseSource {
    fn initialize(&mut self) -> PoseResult<()> {
        match &self.reason {
            Some(reason) => Err(PoseError::InitializationFailed(reason.clone())),
            None => Err(PoseError::NotSupported),
        }
    }

    fn is_ready(&self) -> bool {
        false
    }

    fn poll_latest_result(&self) -> Option<Arc<LandmarkFrame>> {
        None
    }

    fn model_info(&self) -> String {
        "Unavailable pose source (no pose module on this platform)".to_string()
    }
}

// ==============================================================================
// Capability Detection
// ==============================================================================

/// Result of probing the pose module once at startup
pub enum PoseCapability {
    Available(Box<dyn PoseSource>),
    Unavailable { reason: String },
}

impl PoseCapability {
    /// Initialize `source` and decide, once, whether pose features are on
    pub fn detect(mut source: Box<dyn PoseSource>) -> Self {
        match source.initialize() {
            Ok(()) => {
                info!(backend = %source.model_info(), "Pose capability available");
                PoseCapability::Available(source)
            }
            Err(e) => {
                warn!(error = %e, "Pose source failed to initialize, pose features disabled");
                PoseCapability::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PoseCapability::Available(_))
    }

    pub fn source(&self) -> Option<&dyn PoseSource> {
        match self {
            PoseCapability::Available(source) => Some(source.as_ref()),
            PoseCapability::Unavailable { .. } => None,
        }
    }
}
