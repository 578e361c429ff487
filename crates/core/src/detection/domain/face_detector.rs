use thiserror::Error;

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detection_options::DetectionOptions;
use crate::shared::face_image::FaceImage;

#[derive(Error, Debug)]
#[error("face detection failed: {0}")]
pub struct DetectionError(pub String);

impl From<Box<dyn std::error::Error>> for DetectionError {
    fn from(e: Box<dyn std::error::Error>) -> Self {
        DetectionError(e.to_string())
    }
}

/// Domain interface for face detection.
///
/// Detectors are shared across threads: the comparison pipeline runs one
/// call per image concurrently, hence `&self` and `Sync`.
pub trait FaceDetector: Send + Sync {
    fn detect(
        &self,
        image: &FaceImage,
        options: &DetectionOptions,
    ) -> Result<Vec<DetectedFace>, DetectionError>;
}
