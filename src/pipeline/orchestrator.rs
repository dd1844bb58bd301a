use crate::capture::camera::CameraDevice;
use crate::capture::source_adapter::{ImageSourceAdapter, Upload};
use crate::config::Configuration;
use crate::engine::extractor::FeatureExtractor;
use crate::engine::service::InferenceService;
use crate::error::AppError;
use crate::pipeline::state::{CaptureCycle, Phase, PipelineState};
use crate::store::backend::DocumentBackend;
use crate::store::client::StoreClient;
use crate::store::session::Session;
use crate::types::{ImageBuffer, NewFaceRecord};
use std::sync::Arc;
use std::time::Duration;
use tower::Service;
use tracing::{debug, error, info};

/// Sequences capture → inference → (on demand) persistence, holding the
/// session-local pipeline state. Single-flight: a request that arrives
/// while a transient phase is active is a logged no-op.
pub struct PipelineOrchestrator {
    source: ImageSourceAdapter,
    inference: InferenceService,
    store: StoreClient,
    state: PipelineState,
    model_name: String,
}

impl PipelineOrchestrator {
    pub fn new(
        configuration: &Configuration,
        camera: Box<dyn CameraDevice>,
        extractor: Box<dyn FeatureExtractor>,
        backend: Arc<dyn DocumentBackend>,
        session: Session,
    ) -> Self {
        Self {
            source: ImageSourceAdapter::new(camera, configuration.upload_limit_bytes),
            inference: InferenceService::new(
                extractor,
                Duration::from_millis(configuration.inference_timeout_ms),
            ),
            store: StoreClient::new(backend, session, &configuration.app_id),
            state: PipelineState::new(),
            model_name: configuration.model_name.clone(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Captures the current live frame and runs it through inference.
    pub async fn capture_from_live_feed(&mut self) -> Result<(), AppError> {
        if self.reject_if_busy("capture") {
            return Ok(());
        }
        self.begin_capture("Capturing photo...");
        let image = match self.source.capture_from_live_feed().await {
            Ok(image) => image,
            Err(e) => return Err(self.fail_to_idle(e)),
        };
        // A still now replaces the live feed, so the stream can go.
        if let Err(e) = self.source.release_stream().await {
            debug!("Releasing camera stream failed: {e}");
        }
        self.run_inference(image).await
    }

    /// Decodes an uploaded file and runs it through inference.
    pub async fn upload(&mut self, upload: Upload) -> Result<(), AppError> {
        if self.reject_if_busy("upload") {
            return Ok(());
        }
        self.begin_capture("Reading uploaded image...");
        let image = match self.source.load_from_file(upload).await {
            Ok(image) => image,
            Err(e) => return Err(self.fail_to_idle(e)),
        };
        self.run_inference(image).await
    }

    /// Persists the current cycle under `label`. On success the pipeline
    /// resets to idle; on failure the cycle is preserved for a retry.
    pub async fn save(&mut self, label: &str) -> Result<(), AppError> {
        if self.reject_if_busy("save") {
            return Ok(());
        }
        let label = label.trim().to_string();
        if label.is_empty() {
            return Err(self.reject_invalid("Please enter a name before saving."));
        }
        let Some(cycle) = self.state.cycle.clone() else {
            return Err(self.reject_invalid("Capture or upload an image before saving."));
        };

        self.state.phase = Phase::Saving;
        self.state.last_message = format!("Saving data for \"{label}\"...");
        let record = NewFaceRecord {
            label: label.clone(),
            image: cycle.image,
            features: cycle.prediction,
        };
        match self.store.append(record).await {
            Ok(id) => {
                info!(%label, %id, "Record saved; pipeline reset");
                self.state.phase = Phase::Idle;
                self.state.cycle = None;
                self.state.last_message = format!("Data for \"{label}\" saved!");
                Ok(())
            }
            Err(e) => {
                // The cycle survives so the user can retry the save.
                error!("Save failed: {e}");
                self.state.phase = Phase::Ready;
                self.state.last_message = format!("Error saving data: {e}");
                Err(e)
            }
        }
    }

    /// Looks up records by exact label. Runs from Idle or Ready and always
    /// returns to the prior phase; only the search results are updated.
    pub async fn search(&mut self, label: &str) -> Result<(), AppError> {
        if self.reject_if_busy("search") {
            return Ok(());
        }
        let label = label.trim().to_string();
        if label.is_empty() {
            return Err(self.reject_invalid("Enter a name to search."));
        }

        let prior = self.state.phase;
        self.state.phase = Phase::Searching;
        let result = self.store.find_by_label(&label).await;
        self.state.phase = prior;
        match result {
            Ok(records) => {
                self.state.last_message = if records.is_empty() {
                    "No data found.".to_string()
                } else {
                    format!("Found {} entries.", records.len())
                };
                self.state.last_results = records;
                Ok(())
            }
            Err(e) => {
                error!("Search failed: {e}");
                self.state.last_message = format!("Error searching data: {e}");
                Err(e)
            }
        }
    }

    /// Releases the camera stream on pipeline teardown.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.source.release_stream().await {
            debug!("Releasing camera stream on shutdown failed: {e}");
        }
    }

    fn begin_capture(&mut self, message: &str) {
        // Starting a new cycle invalidates the previous image+prediction
        // pair; a stale prediction must never attach to a new image.
        self.state.cycle = None;
        self.state.phase = Phase::Capturing;
        self.state.last_message = message.to_string();
    }

    async fn run_inference(&mut self, image: ImageBuffer) -> Result<(), AppError> {
        self.state.phase = Phase::Inferring;
        self.state.last_message = "Running inference on facial image...".to_string();
        match self.inference.call(image.clone()).await {
            Ok(prediction) => {
                self.state.cycle = Some(CaptureCycle { image, prediction });
                self.state.phase = Phase::Ready;
                self.state.last_message =
                    format!("Inference complete using {}", self.model_name);
                Ok(())
            }
            Err(e) => {
                error!("Inference failed: {e}");
                Err(self.fail_to_idle(e))
            }
        }
    }

    // Rollback to Idle with nothing retained.
    fn fail_to_idle(&mut self, error: AppError) -> AppError {
        self.state.phase = Phase::Idle;
        self.state.cycle = None;
        self.state.last_message = format!("Error: {error}");
        error
    }

    // Validation rejections leave the phase and cycle untouched.
    fn reject_invalid(&mut self, message: &str) -> AppError {
        self.state.last_message = message.to_string();
        AppError::validation(message)
    }

    fn reject_if_busy(&self, request: &str) -> bool {
        if self.state.is_busy() {
            debug!(request, phase = ?self.state.phase, "Request ignored: pipeline busy");
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub(crate) fn force_phase(&mut self, phase: Phase) {
        self.state.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::camera::FakeCamera;
    use crate::engine::impl_stub::StubFeatureExtractor;
    use crate::store::impl_memory::InMemoryBackend;
    use crate::store::session::SessionToken;
    use async_trait::async_trait;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::Value;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that counts calls, to verify validation short-circuits
    /// before the store boundary is reached.
    struct CountingBackend {
        inner: InMemoryBackend,
        queries: AtomicUsize,
        inserts: AtomicUsize,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                inner: InMemoryBackend::new(),
                queries: AtomicUsize::new(0),
                inserts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentBackend for CountingBackend {
        async fn insert(&self, collection: &str, document: Value) -> Result<String, AppError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(collection, document).await
        }

        async fn query_eq(
            &self,
            collection: &str,
            field: &str,
            value: &str,
        ) -> Result<Vec<(String, Value)>, AppError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.query_eq(collection, field, value).await
        }
    }

    fn orchestrator_with(
        camera: Box<dyn CameraDevice>,
        extractor: StubFeatureExtractor,
        backend: Arc<dyn DocumentBackend>,
    ) -> PipelineOrchestrator {
        let session = Session::new();
        session.establish(SessionToken::anonymous());
        PipelineOrchestrator::new(
            &Configuration::immediate(),
            camera,
            Box::new(extractor),
            backend,
            session,
        )
    }

    fn orchestrator() -> PipelineOrchestrator {
        orchestrator_with(
            Box::new(FakeCamera::new()),
            StubFeatureExtractor::immediate(),
            Arc::new(InMemoryBackend::new()),
        )
    }

    fn png_upload(name: &str, shade: u8) -> Upload {
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 12, Rgb([shade, 0, 0])));
        let mut bytes = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        Upload {
            file_name: name.to_string(),
            bytes,
        }
    }

    #[tokio::test]
    async fn capture_infer_save_resets_to_idle() {
        let mut pipeline = orchestrator();
        pipeline.capture_from_live_feed().await.unwrap();

        assert_eq!(pipeline.state().phase, Phase::Ready);
        assert!(pipeline.state().current_image().is_some());
        assert!(pipeline.state().current_prediction().is_some());
        assert!(pipeline.state().last_message.contains("FacialFeatureCNN_v1"));

        pipeline.save("  Alice  ").await.unwrap();
        assert_eq!(pipeline.state().phase, Phase::Idle);
        assert!(pipeline.state().current_image().is_none());
        assert_eq!(pipeline.state().last_message, "Data for \"Alice\" saved!");
    }

    #[tokio::test]
    async fn camera_stream_is_released_once_a_still_is_held() {
        let mut pipeline = orchestrator();
        pipeline.capture_from_live_feed().await.unwrap();
        assert!(!pipeline.source.is_streaming());
    }

    #[tokio::test]
    async fn capture_failure_rolls_back_with_nothing_retained() {
        let mut pipeline = orchestrator_with(
            Box::new(FakeCamera::detached()),
            StubFeatureExtractor::immediate(),
            Arc::new(InMemoryBackend::new()),
        );
        let result = pipeline.capture_from_live_feed().await;
        assert!(matches!(result, Err(AppError::DeviceUnavailable)));
        assert_eq!(pipeline.state().phase, Phase::Idle);
        assert!(pipeline.state().current_image().is_none());
        assert!(pipeline.state().current_prediction().is_none());
    }

    #[tokio::test]
    async fn inference_failure_discards_the_image_too() {
        let mut pipeline = orchestrator_with(
            Box::new(FakeCamera::new()),
            StubFeatureExtractor::immediate().fail_next_inferences(1),
            Arc::new(InMemoryBackend::new()),
        );
        let result = pipeline.capture_from_live_feed().await;
        assert!(matches!(result, Err(AppError::InferenceFailed)));
        // Never an image without a matching prediction, or vice versa.
        assert_eq!(pipeline.state().phase, Phase::Idle);
        assert!(pipeline.state().current_image().is_none());
        assert!(pipeline.state().current_prediction().is_none());
    }

    #[tokio::test]
    async fn a_new_capture_invalidates_the_previous_cycle() {
        let mut pipeline = orchestrator();
        pipeline.upload(png_upload("a.png", 10)).await.unwrap();
        let first_image = pipeline.state().current_image().unwrap().id;

        // A failing second capture must not leave the first pair behind.
        let result = pipeline
            .upload(Upload {
                file_name: "b.txt".to_string(),
                bytes: b"garbage".to_vec(),
            })
            .await;
        assert!(matches!(result, Err(AppError::UnreadableFile)));
        assert!(pipeline.state().current_prediction().is_none());

        // A successful second capture yields a fresh pair.
        pipeline.upload(png_upload("c.png", 200)).await.unwrap();
        assert_ne!(pipeline.state().current_image().unwrap().id, first_image);
    }

    #[tokio::test]
    async fn save_requires_a_label_and_a_cycle() {
        let mut pipeline = orchestrator();
        assert!(matches!(
            pipeline.save("Alice").await,
            Err(AppError::Validation(_))
        ));

        pipeline.upload(png_upload("a.png", 5)).await.unwrap();
        assert!(matches!(
            pipeline.save("   ").await,
            Err(AppError::Validation(_))
        ));
        // Validation leaves the cycle intact for a corrected retry.
        assert_eq!(pipeline.state().phase, Phase::Ready);
        assert!(pipeline.state().current_image().is_some());
    }

    #[tokio::test]
    async fn failed_save_preserves_the_cycle_for_retry() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut pipeline = orchestrator_with(
            Box::new(FakeCamera::new()),
            StubFeatureExtractor::immediate(),
            backend.clone(),
        );
        pipeline.capture_from_live_feed().await.unwrap();

        backend.set_offline(true);
        let result = pipeline.save("Bea").await;
        assert!(matches!(result, Err(AppError::StoreUnavailable)));
        assert_eq!(pipeline.state().phase, Phase::Ready);
        assert!(pipeline.state().current_image().is_some());

        backend.set_offline(false);
        pipeline.save("Bea").await.unwrap();
        assert_eq!(pipeline.state().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn blank_search_never_reaches_the_store() {
        let backend = Arc::new(CountingBackend::new());
        let mut pipeline = orchestrator_with(
            Box::new(FakeCamera::new()),
            StubFeatureExtractor::immediate(),
            backend.clone(),
        );
        let result = pipeline.search("   ").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(backend.queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_returns_to_the_prior_phase_with_cycle_intact() {
        let mut pipeline = orchestrator();
        pipeline.upload(png_upload("a.png", 77)).await.unwrap();
        pipeline.save("Cara").await.unwrap();

        pipeline.upload(png_upload("b.png", 78)).await.unwrap();
        assert_eq!(pipeline.state().phase, Phase::Ready);

        pipeline.search("Cara").await.unwrap();
        assert_eq!(pipeline.state().phase, Phase::Ready);
        assert!(pipeline.state().current_image().is_some());
        assert_eq!(pipeline.state().last_results.len(), 1);
        assert_eq!(pipeline.state().last_message, "Found 1 entries.");
    }

    #[tokio::test]
    async fn repeated_labels_accumulate_and_match_exactly() {
        let mut pipeline = orchestrator();
        for shade in [1u8, 2u8] {
            pipeline
                .upload(png_upload("face.png", shade))
                .await
                .unwrap();
            pipeline.save("Alice").await.unwrap();
        }

        pipeline.search("Alice").await.unwrap();
        assert_eq!(pipeline.state().last_results.len(), 2);

        pipeline.search("alice").await.unwrap();
        assert!(pipeline.state().last_results.is_empty());
        assert_eq!(pipeline.state().last_message, "No data found.");
    }

    #[tokio::test]
    async fn requests_while_busy_are_ignored() {
        let mut pipeline = orchestrator();
        pipeline.upload(png_upload("a.png", 9)).await.unwrap();
        let held_image = pipeline.state().current_image().unwrap().id;

        pipeline.force_phase(Phase::Saving);
        pipeline.capture_from_live_feed().await.unwrap();
        pipeline.save("Dee").await.unwrap();
        pipeline.search("Dee").await.unwrap();

        // Nothing happened: phase and cycle are exactly as before.
        assert_eq!(pipeline.state().phase, Phase::Saving);
        assert_eq!(pipeline.state().current_image().unwrap().id, held_image);
        assert!(pipeline.state().last_results.is_empty());
    }
}
