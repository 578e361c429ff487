use thiserror::Error;

use crate::imaging::domain::image_source::ImageSource;
use crate::shared::face_image::FaceImage;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unable to read {source_name}: {reason}")]
    Unreadable { source_name: String, reason: String },
    #[error("unable to decode {source_name}: {reason}")]
    Undecodable { source_name: String, reason: String },
    #[error("invalid image reference: {0}")]
    InvalidReference(String),
}

/// Resolves an [`ImageSource`] into a decoded RGB [`FaceImage`].
///
/// Implementations may block on I/O; the pipeline calls them before any
/// concurrent work starts.
pub trait ImageLoader: Send + Sync {
    fn load(&self, source: &ImageSource) -> Result<FaceImage, LoadError>;
}
