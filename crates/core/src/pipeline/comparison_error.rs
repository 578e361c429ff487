use thiserror::Error;

use crate::comparison::domain::face_cropper::CropError;
use crate::comparison::domain::face_gallery::GalleryError;
use crate::detection::domain::detection_coordinator::{CoordinatorError, ImageSide};
use crate::imaging::domain::image_loader::LoadError;

/// Terminal failure of a pipeline run.
///
/// Every variant maps to a stable [`category`](ComparisonError::category)
/// string that callers can match on.
#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("Failed to load {side}: {source}")]
    ImageLoad {
        side: ImageSide,
        #[source]
        source: LoadError,
    },
    #[error("Face detection failed for {side}: {message}")]
    Detection { side: ImageSide, message: String },
    #[error("{side} must contain exactly one face; found {count}")]
    FaceCount { side: ImageSide, count: usize },
    #[error("Failed to crop face in {side}: {source}")]
    Process {
        side: ImageSide,
        #[source]
        source: CropError,
    },
    #[error("Failed to compute embedding for {side}: {message}")]
    Embed { side: ImageSide, message: String },
    #[error("Invalid setup: {0}")]
    Prepare(String),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

impl ComparisonError {
    pub fn category(&self) -> &'static str {
        match self {
            ComparisonError::ImageLoad { .. } => "IMAGE_LOAD_ERROR",
            ComparisonError::Detection { .. } => "DETECTION_ERROR",
            ComparisonError::FaceCount { .. } => "FACE_COUNT_ERROR",
            ComparisonError::Process { .. } => "PROCESS_ERROR",
            ComparisonError::Embed { .. } => "EMBED_ERROR",
            ComparisonError::Prepare(_) => "PREPARE_ERROR",
            ComparisonError::Gallery(_) => "GALLERY_ERROR",
        }
    }

    /// The image the failure belongs to, when there is one.
    pub fn side(&self) -> Option<ImageSide> {
        match self {
            ComparisonError::ImageLoad { side, .. }
            | ComparisonError::Detection { side, .. }
            | ComparisonError::FaceCount { side, .. }
            | ComparisonError::Process { side, .. }
            | ComparisonError::Embed { side, .. } => Some(*side),
            ComparisonError::Prepare(_) | ComparisonError::Gallery(_) => None,
        }
    }
}

impl From<CoordinatorError> for ComparisonError {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::DetectionFailed { side, message } => {
                ComparisonError::Detection { side, message }
            }
            CoordinatorError::FaceCount { side, count } => ComparisonError::FaceCount { side, count },
        }
    }
}
