use std::fs;
use std::path::{Path, PathBuf};

use crate::comparison::domain::face_gallery::{FaceGallery, GalleryError};
use crate::comparison::domain::gallery_store::GalleryStore;
use crate::shared::constants::{APP_DIR_NAME, GALLERY_FILE_NAME};

/// Persists a [`FaceGallery`] as pretty-printed JSON.
pub struct JsonGalleryStore {
    path: PathBuf,
}

impl JsonGalleryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data dir>/FaceMatch/gallery.json`, if the platform has a
    /// data directory.
    pub fn default_location() -> Option<Self> {
        dirs::data_dir().map(|d| Self::new(d.join(APP_DIR_NAME).join(GALLERY_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GalleryStore for JsonGalleryStore {
    /// A missing file is an empty gallery.
    fn load(&self) -> Result<FaceGallery, GalleryError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No gallery at {}, starting empty", self.path.display());
                return Ok(FaceGallery::new());
            }
            Err(source) => {
                return Err(GalleryError::Read {
                    path: self.path.display().to_string(),
                    source,
                })
            }
        };

        let gallery: FaceGallery =
            serde_json::from_str(&json).map_err(|source| GalleryError::Malformed {
                path: self.path.display().to_string(),
                source,
            })?;
        gallery.validate()?;
        Ok(gallery)
    }

    /// Writes to a sibling temp file first, then renames over the target.
    fn save(&self, gallery: &FaceGallery) -> Result<(), GalleryError> {
        let write_err = |source| GalleryError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(gallery).map_err(|source| {
            GalleryError::Malformed {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        log::debug!(
            "Saved {} gallery entries to {}",
            gallery.len(),
            self.path.display()
        );
        Ok(())
    }
}
