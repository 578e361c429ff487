use thiserror::Error;

use crate::embedding::domain::embedding::Embedding;
use crate::shared::face_image::FaceImage;

#[derive(Error, Debug)]
#[error("embedding failed: {0}")]
pub struct EmbedError(pub String);

impl From<Box<dyn std::error::Error>> for EmbedError {
    fn from(e: Box<dyn std::error::Error>) -> Self {
        EmbedError(e.to_string())
    }
}

/// Converts a cropped face into a fixed-length embedding.
///
/// The provider only borrows the crop; the caller keeps ownership and
/// releases it. Output length is fixed per model.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, face: &FaceImage) -> Result<Embedding, EmbedError>;
}
