pub mod extractor;
pub mod impl_stub;
pub mod service;

pub use extractor::{FeatureExtractor, ModelHandle};
pub use impl_stub::StubFeatureExtractor;
pub use service::InferenceService;
