use crate::comparison::domain::gallery_store::GalleryStore;
use crate::pipeline::comparison_error::ComparisonError;

/// Removes named faces from the gallery, or clears it.
pub struct ForgetFaceUseCase {
    store: Box<dyn GalleryStore>,
}

impl ForgetFaceUseCase {
    pub fn new(store: Box<dyn GalleryStore>) -> Self {
        Self { store }
    }

    /// Returns whether `name` was enrolled. The gallery is only rewritten
    /// when something changed.
    pub fn execute(&self, name: &str) -> Result<bool, ComparisonError> {
        let mut gallery = self.store.load()?;
        let removed = gallery.remove(name);
        if removed {
            self.store.save(&gallery)?;
            log::info!("Removed {name} from gallery");
        } else {
            log::warn!("{name} is not enrolled");
        }
        Ok(removed)
    }

    /// Returns how many faces were removed.
    pub fn clear(&self) -> Result<usize, ComparisonError> {
        let mut gallery = self.store.load()?;
        let count = gallery.len();
        gallery.clear();
        self.store.save(&gallery)?;
        log::info!("Cleared {count} face(s) from gallery");
        Ok(count)
    }
}
