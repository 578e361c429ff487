use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Smallest face to report, as a fraction of the image width.
pub const DEFAULT_MIN_FACE_SIZE: f64 = 0.15;

#[derive(Error, Debug, PartialEq)]
pub enum InvalidOptions {
    #[error("confidence must be between 0.0 and 1.0, got {0}")]
    Confidence(f64),
    #[error("min face size must be between 0.0 and 1.0, got {0}")]
    MinFaceSize(f64),
}

/// Knobs passed to a [`FaceDetector`](super::face_detector::FaceDetector)
/// on every call.
///
/// Auxiliary outputs (`landmarks`, `tracking`) are only computed when asked
/// for; the comparison pipeline never needs them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionOptions {
    pub confidence: f64,
    pub min_face_size: f64,
    pub landmarks: bool,
    pub tracking: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
            landmarks: false,
            tracking: false,
        }
    }
}

impl DetectionOptions {
    pub fn validate(&self) -> Result<(), InvalidOptions> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(InvalidOptions::Confidence(self.confidence));
        }
        if !(0.0..=1.0).contains(&self.min_face_size) {
            return Err(InvalidOptions::MinFaceSize(self.min_face_size));
        }
        Ok(())
    }
}
