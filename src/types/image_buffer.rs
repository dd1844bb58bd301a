use crate::error::AppError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use uuid::Uuid;

/// Normalized in-memory representation of one captured or uploaded still
/// image. Immutable after creation; a new capture cycle replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageBuffer {
    pub id: Uuid,
    /// Self-describing encoding, e.g. `data:image/png;base64,...`.
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl ImageBuffer {
    /// Encodes a decoded frame (live capture path) as a PNG data URL.
    pub fn from_frame(frame: &DynamicImage) -> Result<Self, AppError> {
        let mut png = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|_| AppError::UnreadableFile)?;
        Ok(Self {
            id: Uuid::new_v4(),
            data_url: format!("data:image/png;base64,{}", STANDARD.encode(&png)),
            width: frame.width(),
            height: frame.height(),
        })
    }

    /// Wraps uploaded bytes as-is (upload path); the caller has already
    /// decoded them, so the original encoding and media type are kept.
    pub fn from_encoded(bytes: &[u8], format: ImageFormat, decoded: &DynamicImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            data_url: format!(
                "data:{};base64,{}",
                format.to_mime_type(),
                STANDARD.encode(bytes)
            ),
            width: decoded.width(),
            height: decoded.height(),
        }
    }
}
