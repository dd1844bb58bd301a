use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeColor {
    Blue,
    Brown,
    Green,
    Hazel,
}

impl EyeColor {
    pub const ALL: [EyeColor; 4] = [
        EyeColor::Blue,
        EyeColor::Brown,
        EyeColor::Green,
        EyeColor::Hazel,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceShape {
    Oval,
    Round,
    Square,
    Heart,
    Long,
}

impl FaceShape {
    pub const ALL: [FaceShape; 5] = [
        FaceShape::Oval,
        FaceShape::Round,
        FaceShape::Square,
        FaceShape::Heart,
        FaceShape::Long,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Categorical output of one inference call over one image. Immutable;
/// either saved as part of a record or discarded with its image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturePrediction {
    pub eye_color: EyeColor,
    pub face_shape: FaceShape,
    pub gender: Gender,
    pub confidence: f64,
}
