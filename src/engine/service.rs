use crate::engine::extractor::FeatureExtractor;
use crate::error::AppError;
use crate::types::{FeaturePrediction, ImageBuffer};
use futures::Future;
use futures::task::{Context, Poll};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::Service;
use tracing::warn;

/// `tower::Service` seam around a [`FeatureExtractor`]. Applies the bounded
/// inference timeout so a silent hang in the model surfaces as
/// `ModelLoadFailed` (model not yet loaded) or `InferenceFailed`.
#[derive(Clone)]
pub struct InferenceService {
    extractor: Arc<Mutex<Box<dyn FeatureExtractor>>>,
    timeout: Duration,
}

impl InferenceService {
    pub fn new(extractor: Box<dyn FeatureExtractor>, timeout: Duration) -> Self {
        Self {
            extractor: Arc::new(Mutex::new(extractor)),
            timeout,
        }
    }
}

impl Service<ImageBuffer> for InferenceService {
    type Response = FeaturePrediction;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, image: ImageBuffer) -> Self::Future {
        let extractor = self.extractor.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            let mut extractor = extractor.lock().await;
            let loaded = extractor.handle().is_some();
            match tokio::time::timeout(timeout, extractor.infer(&image)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(image = %image.id, "Inference timed out after {:?}", timeout);
                    if loaded {
                        Err(AppError::InferenceFailed)
                    } else {
                        Err(AppError::ModelLoadFailed)
                    }
                }
            }
        })
    }
}
