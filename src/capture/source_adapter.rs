use crate::capture::camera::CameraDevice;
use crate::error::AppError;
use crate::types::ImageBuffer;
use image::ImageReader;
use std::io::Cursor;
use tracing::{debug, info};

/// An uploaded file, as handed over by the presentation layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Normalizes the two image origins (live camera frame, file upload) into
/// one in-memory representation.
pub struct ImageSourceAdapter {
    camera: Box<dyn CameraDevice>,
    upload_limit_bytes: usize,
}

impl ImageSourceAdapter {
    pub fn new(camera: Box<dyn CameraDevice>, upload_limit_bytes: usize) -> Self {
        Self {
            camera,
            upload_limit_bytes,
        }
    }

    /// Grabs the current live frame and encodes it. Acquires the media
    /// stream on first use; fails with `DeviceUnavailable` if no camera is
    /// attached or permission was denied.
    pub async fn capture_from_live_feed(&mut self) -> Result<ImageBuffer, AppError> {
        self.camera.start().await?;
        let frame = self.camera.grab_frame().await?;
        let buffer = ImageBuffer::from_frame(&frame)?;
        debug!(width = buffer.width, height = buffer.height, "Captured live frame");
        Ok(buffer)
    }

    /// Validates and decodes an uploaded file. The size gate runs before
    /// any decoding; a payload of exactly the limit passes.
    pub async fn load_from_file(&self, upload: Upload) -> Result<ImageBuffer, AppError> {
        if upload.bytes.len() > self.upload_limit_bytes {
            return Err(AppError::PayloadTooLarge {
                size: upload.bytes.len(),
                limit: self.upload_limit_bytes,
            });
        }
        let reader = ImageReader::new(Cursor::new(&upload.bytes))
            .with_guessed_format()
            .map_err(|_| AppError::UnreadableFile)?;
        let format = reader.format().ok_or(AppError::UnreadableFile)?;
        let decoded = reader.decode().map_err(|_| AppError::UnreadableFile)?;
        info!(file = %upload.file_name, "Decoded uploaded image");
        Ok(ImageBuffer::from_encoded(&upload.bytes, format, &decoded))
    }

    /// While a captured still is displayed the live stream is not needed;
    /// the orchestrator calls this after a capture completes and on teardown.
    pub async fn release_stream(&mut self) -> Result<(), AppError> {
        self.camera.stop().await
    }

    pub fn is_streaming(&self) -> bool {
        self.camera.is_streaming()
    }
}
