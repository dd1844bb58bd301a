pub mod image_buffer;
pub mod prediction;
pub mod record;

pub use image_buffer::ImageBuffer;
pub use prediction::{EyeColor, FaceShape, FeaturePrediction, Gender};
pub use record::{FaceRecord, NewFaceRecord};
