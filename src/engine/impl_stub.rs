use crate::config::Configuration;
use crate::engine::extractor::{FeatureExtractor, ModelHandle};
use crate::error::AppError;
use crate::types::{EyeColor, FaceShape, FeaturePrediction, Gender, ImageBuffer};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed-latency stand-in for a real extraction model: a simulated download
/// on first use, then a preprocess step and a forward pass per call, with
/// outputs drawn from small fixed category sets.
pub struct StubFeatureExtractor {
    handle: Option<ModelHandle>,
    model_name: String,
    model_version: String,
    load_delay: Duration,
    preprocess_delay: Duration,
    predict_delay: Duration,
    load_attempts: u32,
    // Test knobs: the next N load / infer calls fail.
    fail_loads: u32,
    fail_inferences: u32,
}

impl StubFeatureExtractor {
    pub fn new(configuration: &Configuration) -> Self {
        Self {
            handle: None,
            model_name: configuration.model_name.clone(),
            model_version: configuration.model_version.clone(),
            load_delay: Duration::from_millis(configuration.model_load_delay_ms),
            preprocess_delay: Duration::from_millis(configuration.preprocess_delay_ms),
            predict_delay: Duration::from_millis(configuration.predict_delay_ms),
            load_attempts: 0,
            fail_loads: 0,
            fail_inferences: 0,
        }
    }

    /// Zero-latency construction for tests.
    pub fn immediate() -> Self {
        Self::new(&Configuration::immediate())
    }

    pub fn fail_next_loads(mut self, count: u32) -> Self {
        self.fail_loads = count;
        self
    }

    pub fn fail_next_inferences(mut self, count: u32) -> Self {
        self.fail_inferences = count;
        self
    }

    pub fn load_attempts(&self) -> u32 {
        self.load_attempts
    }

    fn draw_prediction() -> FeaturePrediction {
        let mut rng = rand::rng();
        FeaturePrediction {
            eye_color: EyeColor::ALL[rng.random_range(0..EyeColor::ALL.len())],
            face_shape: FaceShape::ALL[rng.random_range(0..FaceShape::ALL.len())],
            // The reference model always reports male; kept as a quirk of
            // the stub rather than silently rebalanced.
            gender: Gender::Male,
            confidence: rng.random_range(0.70..=0.95),
        }
    }
}

#[async_trait]
impl FeatureExtractor for StubFeatureExtractor {
    async fn load(&mut self) -> Result<ModelHandle, AppError> {
        if let Some(handle) = &self.handle {
            return Ok(handle.clone());
        }
        self.load_attempts += 1;
        info!(model = %self.model_name, "Initializing model download...");
        tokio::time::sleep(self.load_delay).await;
        if self.fail_loads > 0 {
            self.fail_loads -= 1;
            warn!(model = %self.model_name, "Model load failed");
            return Err(AppError::ModelLoadFailed);
        }
        let handle = ModelHandle {
            name: self.model_name.clone(),
            version: self.model_version.clone(),
        };
        info!(model = %handle.name, version = %handle.version, "Model loaded");
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    async fn infer(&mut self, image: &ImageBuffer) -> Result<FeaturePrediction, AppError> {
        let handle = self.load().await?;
        debug!(image = %image.id, "Preprocessing image for model input");
        tokio::time::sleep(self.preprocess_delay).await;
        debug!(model = %handle.name, "Performing forward pass");
        tokio::time::sleep(self.predict_delay).await;
        if self.fail_inferences > 0 {
            self.fail_inferences -= 1;
            return Err(AppError::InferenceFailed);
        }
        Ok(Self::draw_prediction())
    }

    fn handle(&self) -> Option<&ModelHandle> {
        self.handle.as_ref()
    }
}
