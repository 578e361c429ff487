use crate::comparison::domain::face_gallery::{GalleryEntry, GalleryError};
use crate::comparison::domain::gallery_store::GalleryStore;
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::embedding::domain::embedding_provider::EmbeddingProvider;
use crate::imaging::domain::image_loader::ImageLoader;
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::comparison_error::ComparisonError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::stages::embed_single_face;

/// Adds a named reference face to the gallery.
///
/// The image must contain exactly one face. The gallery is re-read before
/// and written after, so concurrent CLI runs see each other's changes.
pub struct EnrollFaceUseCase {
    loader: Box<dyn ImageLoader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn EmbeddingProvider>,
    store: Box<dyn GalleryStore>,
    options: DetectionOptions,
    logger: Box<dyn PipelineLogger>,
}

impl EnrollFaceUseCase {
    pub fn new(
        loader: Box<dyn ImageLoader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn EmbeddingProvider>,
        store: Box<dyn GalleryStore>,
        options: DetectionOptions,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            loader,
            detector,
            embedder,
            store,
            options,
            logger,
        }
    }

    /// Enrolls `source` under `name`. Without an explicit `user_id` the next
    /// free numeric id is used.
    pub fn execute(
        &mut self,
        name: &str,
        user_id: Option<&str>,
        source: &ImageSource,
    ) -> Result<GalleryEntry, ComparisonError> {
        let mut gallery = self.store.load()?;
        if gallery.get(name).is_some() {
            return Err(GalleryError::AlreadyRegistered(name.to_string()).into());
        }

        let embedding = embed_single_face(
            self.loader.as_ref(),
            self.detector.as_ref(),
            self.embedder.as_ref(),
            &self.options,
            source,
            self.logger.as_mut(),
        )?;

        let user_id = match user_id {
            Some(id) => id.to_string(),
            None => next_user_id(gallery.entries()),
        };
        let entry = GalleryEntry {
            user_id,
            name: name.to_string(),
            embedding,
            source: Some(source.to_string()),
        };
        gallery.register(entry.clone())?;
        self.store.save(&gallery)?;

        self.logger
            .info(&format!("Enrolled {name} ({} faces in gallery)", gallery.len()));
        self.logger.summary();
        Ok(entry)
    }
}

fn next_user_id<'a>(entries: impl Iterator<Item = &'a GalleryEntry>) -> String {
    let max = entries
        .filter_map(|e| e.user_id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}
