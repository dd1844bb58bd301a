use crate::types::{FeaturePrediction, ImageBuffer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for an append; the store assigns `id` and the client stamps
/// `created_at` at write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFaceRecord {
    pub label: String,
    pub image: ImageBuffer,
    pub features: FeaturePrediction,
}

/// Persisted unit combining a label, an image and a feature prediction.
/// Owned by the shared store once written; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRecord {
    pub id: String,
    pub label: String,
    pub image: ImageBuffer,
    pub features: FeaturePrediction,
    pub created_at: DateTime<Utc>,
}
