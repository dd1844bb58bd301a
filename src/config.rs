use crate::error::AppError;
use serde::Deserialize;

const UPLOAD_LIMIT_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Tenant namespace; records live under `{app_id}/faces`.
    pub app_id: String,
    pub upload_limit_bytes: usize,
    pub model_name: String,
    pub model_version: String,
    // Simulated model latencies. Zero is valid and used by tests.
    pub model_load_delay_ms: u64,
    pub preprocess_delay_ms: u64,
    pub predict_delay_ms: u64,
    pub inference_timeout_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            app_id: "facelab".to_string(),
            upload_limit_bytes: UPLOAD_LIMIT_BYTES,
            model_name: "FacialFeatureCNN_v1".to_string(),
            model_version: "1.0.0".to_string(),
            model_load_delay_ms: 2000,
            preprocess_delay_ms: 500,
            predict_delay_ms: 1500,
            inference_timeout_ms: 10_000,
        }
    }
}

impl Configuration {
    /// Layers an optional `facelab.toml` and `FACELAB_*` environment
    /// variables over the defaults.
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("facelab").required(false))
            .add_source(config::Environment::with_prefix("FACELAB").try_parsing(true))
            .build()
            .map_err(|e| AppError::validation(format!("Invalid configuration: {e}")))?;
        settings
            .try_deserialize()
            .map_err(|e| AppError::validation(format!("Invalid configuration: {e}")))
    }

    /// All simulated latencies set to zero, for tests.
    pub fn immediate() -> Self {
        Self {
            model_load_delay_ms: 0,
            preprocess_delay_ms: 0,
            predict_delay_ms: 0,
            ..Self::default()
        }
    }
}
