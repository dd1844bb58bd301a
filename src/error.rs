use thiserror::Error;

// Main application error type. Every pipeline stage surfaces one of these
// and the orchestrator converts it into a user-visible message.

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No camera attached or permission was denied.")]
    DeviceUnavailable,
    #[error("File of {size} bytes exceeds the {limit} byte upload limit.")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Uploaded file could not be decoded as an image.")]
    UnreadableFile,
    #[error("Failed to load the feature extraction model.")]
    ModelLoadFailed,
    #[error("Inference failed on the captured image.")]
    InferenceFailed,
    #[error("Record store is unreachable.")]
    StoreUnavailable,
    #[error("No session established; sign in before using the store.")]
    Unauthorized,
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}
