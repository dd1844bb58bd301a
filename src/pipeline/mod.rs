pub mod orchestrator;
pub mod state;

pub use orchestrator::PipelineOrchestrator;
pub use state::{CaptureCycle, Phase, PipelineState};
