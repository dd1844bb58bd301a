use crate::error::AppError;
use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::info;

/// Live video source. The stream is acquired once, held for the session and
/// released when a captured still replaces the live feed or on teardown.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Acquires the media stream; idempotent while already started.
    async fn start(&mut self) -> Result<(), AppError>;
    async fn stop(&mut self) -> Result<(), AppError>;
    fn is_streaming(&self) -> bool;
    /// Grabs the current frame from the live stream.
    async fn grab_frame(&self) -> Result<DynamicImage, AppError>;
}

/// Stand-in camera producing a synthetic frame. A device can be "detached"
/// to simulate a denied permission prompt or missing hardware.
pub struct FakeCamera {
    attached: bool,
    streaming: bool,
    width: u32,
    height: u32,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            attached: true,
            streaming: false,
            width: 640,
            height: 480,
        }
    }

    pub fn detached() -> Self {
        Self {
            attached: false,
            ..Self::new()
        }
    }
}

impl Default for FakeCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn start(&mut self) -> Result<(), AppError> {
        if !self.attached {
            return Err(AppError::DeviceUnavailable);
        }
        if !self.streaming {
            info!("Camera stream acquired");
            self.streaming = true;
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), AppError> {
        if self.streaming {
            info!("Camera stream released");
            self.streaming = false;
        }
        Ok(())
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }

    async fn grab_frame(&self) -> Result<DynamicImage, AppError> {
        if !self.attached || !self.streaming {
            return Err(AppError::DeviceUnavailable);
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            self.width,
            self.height,
            Rgb([96, 128, 160]),
        )))
    }
}
