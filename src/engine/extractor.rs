use crate::error::AppError;
use crate::types::{FeaturePrediction, ImageBuffer};
use async_trait::async_trait;

/// Identity of the loaded inference model. Absent until the first inference
/// request; created once per extractor instance and never torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    pub name: String,
    pub version: String,
}

/// Capability interface around the feature-extraction model. The stub and
/// any future real adapter both live behind this trait; the pipeline never
/// branches on which one it holds.
#[async_trait]
pub trait FeatureExtractor: Send + Sync {
    /// One-time model load. A failed load leaves the handle absent so the
    /// next call retries; it is never memoized as failed.
    async fn load(&mut self) -> Result<ModelHandle, AppError>;

    /// Maps an image to a feature prediction, loading the model first if
    /// needed. Holds no state between calls beyond the model handle.
    async fn infer(&mut self, image: &ImageBuffer) -> Result<FeaturePrediction, AppError>;

    fn handle(&self) -> Option<&ModelHandle>;
}
