use crate::types::{FaceRecord, FeaturePrediction, ImageBuffer};

/// Explicit pipeline phase. At most one of the transient phases
/// (Capturing, Inferring, Saving, Searching) is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Inferring,
    Ready,
    Saving,
    Searching,
}

impl Phase {
    /// Stable phases accept new requests; transient ones reject them.
    pub fn is_busy(self) -> bool {
        !matches!(self, Phase::Idle | Phase::Ready)
    }
}

/// Image and prediction from one capture cycle, stored as a unit so a stale
/// prediction can never be paired with a newer image.
#[derive(Debug, Clone)]
pub struct CaptureCycle {
    pub image: ImageBuffer,
    pub prediction: FeaturePrediction,
}

/// Session-local pipeline state, mutated by the orchestrator at each stage
/// transition and reset after a successful save.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub phase: Phase,
    /// Present exactly when a full capture cycle completed (Ready and the
    /// phases entered from Ready).
    pub cycle: Option<CaptureCycle>,
    pub last_message: String,
    /// Results of the most recent search; independent of the capture cycle.
    pub last_results: Vec<FaceRecord>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            cycle: None,
            last_message: String::new(),
            last_results: Vec::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn current_image(&self) -> Option<&ImageBuffer> {
        self.cycle.as_ref().map(|cycle| &cycle.image)
    }

    pub fn current_prediction(&self) -> Option<&FeaturePrediction> {
        self.cycle.as_ref().map(|cycle| &cycle.prediction)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
