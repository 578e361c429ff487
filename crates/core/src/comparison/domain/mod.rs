pub mod face_comparator;
pub mod face_cropper;
pub mod face_gallery;
pub mod gallery_store;
