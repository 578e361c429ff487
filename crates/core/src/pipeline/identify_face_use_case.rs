use crate::comparison::domain::face_comparator::FaceComparator;
use crate::comparison::domain::face_gallery::Identification;
use crate::comparison::domain::gallery_store::GalleryStore;
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::embedding::domain::embedding_provider::EmbeddingProvider;
use crate::imaging::domain::image_loader::ImageLoader;
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::comparison_error::ComparisonError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::stages::{embed_single_face, timed};

/// Names the single face in an image against the enrolled gallery.
pub struct IdentifyFaceUseCase {
    loader: Box<dyn ImageLoader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn EmbeddingProvider>,
    store: Box<dyn GalleryStore>,
    comparator: FaceComparator,
    options: DetectionOptions,
    logger: Box<dyn PipelineLogger>,
}

impl IdentifyFaceUseCase {
    pub fn new(
        loader: Box<dyn ImageLoader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn EmbeddingProvider>,
        store: Box<dyn GalleryStore>,
        comparator: FaceComparator,
        options: DetectionOptions,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            loader,
            detector,
            embedder,
            store,
            comparator,
            options,
            logger,
        }
    }

    pub fn execute(&mut self, source: &ImageSource) -> Result<Identification, ComparisonError> {
        let gallery = self.store.load()?;
        if gallery.is_empty() {
            log::warn!("Gallery is empty; every face will be unknown");
        }

        let embedding = embed_single_face(
            self.loader.as_ref(),
            self.detector.as_ref(),
            self.embedder.as_ref(),
            &self.options,
            source,
            self.logger.as_mut(),
        )?;

        let comparator = &self.comparator;
        let identification = timed(self.logger.as_mut(), "compare", || {
            gallery.identify(&embedding, comparator)
        })?;

        self.logger.info(&format!(
            "Identified {source} as {} (similarity {})",
            identification.name, identification.similarity
        ));
        self.logger.summary();
        Ok(identification)
    }
}
