use crate::comparison::domain::face_comparator::{ComparisonResult, FaceComparator};
use crate::detection::domain::detection_coordinator::{detect_single_faces, ImageSide};
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::embedding::domain::embedding_provider::EmbeddingProvider;
use crate::imaging::domain::image_loader::ImageLoader;
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::comparison_error::ComparisonError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::stages::{crop, embed, load, timed};

/// Two-image comparison pipeline: load → detect → crop → embed → compare.
///
/// Every stage failure ends the run. Image buffers are owned by this
/// function's locals, so each one is released exactly once whichever way
/// the run ends; originals go as soon as both crops exist, crops as soon
/// as both embeddings exist.
pub struct CompareFacesUseCase {
    loader: Box<dyn ImageLoader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn EmbeddingProvider>,
    comparator: FaceComparator,
    options: DetectionOptions,
    logger: Box<dyn PipelineLogger>,
}

impl CompareFacesUseCase {
    pub fn new(
        loader: Box<dyn ImageLoader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn EmbeddingProvider>,
        comparator: FaceComparator,
        options: DetectionOptions,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            loader,
            detector,
            embedder,
            comparator,
            options,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        first: &ImageSource,
        second: &ImageSource,
    ) -> Result<ComparisonResult, ComparisonError> {
        let result = self.run(first, second);
        match &result {
            Ok(r) => self.logger.info(&format!(
                "Comparison finished: match={} distance={:.4}",
                r.is_match, r.distance
            )),
            Err(e) => self
                .logger
                .info(&format!("Comparison failed [{}]: {e}", e.category())),
        }
        self.logger.summary();
        result
    }

    fn run(
        &mut self,
        first: &ImageSource,
        second: &ImageSource,
    ) -> Result<ComparisonResult, ComparisonError> {
        self.options
            .validate()
            .map_err(|e| ComparisonError::Prepare(e.to_string()))?;

        let loader = self.loader.as_ref();
        let logger = self.logger.as_mut();

        let (image_a, image_b) = timed(logger, "load", || {
            let a = load(loader, ImageSide::First, first)?;
            let b = load(loader, ImageSide::Second, second)?;
            Ok::<_, ComparisonError>((a, b))
        })?;

        let detector = self.detector.as_ref();
        let options = &self.options;
        let (box_a, box_b) = timed(logger, "detect", || {
            detect_single_faces(&image_a, &image_b, detector, options)
        })?;

        let (face_a, face_b) = timed(logger, "crop", || {
            let a = crop(ImageSide::First, &image_a, &box_a)?;
            let b = crop(ImageSide::Second, &image_b, &box_b)?;
            Ok::<_, ComparisonError>((a, b))
        })?;
        drop(image_a);
        drop(image_b);

        let embedder = self.embedder.as_ref();
        let (embedding_a, embedding_b) = timed(logger, "embed", || {
            let a = embed(embedder, ImageSide::First, &face_a)?;
            let b = embed(embedder, ImageSide::Second, &face_b)?;
            Ok::<_, ComparisonError>((a, b))
        })?;
        drop(face_a);
        drop(face_b);

        Ok(timed(logger, "compare", || {
            self.comparator.compare(&embedding_a, &embedding_b)
        }))
    }
}
