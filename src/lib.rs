pub mod capture;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod types;

pub use config::Configuration;
pub use error::AppError;

pub use capture::{CameraDevice, FakeCamera, ImageSourceAdapter, Upload};
pub use engine::{FeatureExtractor, InferenceService, ModelHandle, StubFeatureExtractor};
pub use pipeline::{Phase, PipelineOrchestrator, PipelineState};
pub use store::{DocumentBackend, InMemoryBackend, Session, SessionToken, StoreClient};
pub use types::{FaceRecord, FeaturePrediction, ImageBuffer, NewFaceRecord};
