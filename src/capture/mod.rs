pub mod camera;
pub mod source_adapter;

pub use camera::{CameraDevice, FakeCamera};
pub use source_adapter::{ImageSourceAdapter, Upload};
