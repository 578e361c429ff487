use crate::comparison::domain::face_gallery::{FaceGallery, GalleryError};

/// Persistence for the enrolled gallery.
pub trait GalleryStore: Send {
    fn load(&self) -> Result<FaceGallery, GalleryError>;
    fn save(&self, gallery: &FaceGallery) -> Result<(), GalleryError>;
}
