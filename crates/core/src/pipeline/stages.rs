//! Stage steps shared by the use cases. Each maps its layer's error into
//! [`ComparisonError`] tagged with the image it concerns.

use std::time::Instant;

use crate::comparison::domain::face_cropper;
use crate::detection::domain::detection_coordinator::{single_face, ImageSide};
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::detected_face::DetectedFace;
use crate::embedding::domain::embedding::Embedding;
use crate::embedding::domain::embedding_provider::EmbeddingProvider;
use crate::imaging::domain::image_loader::ImageLoader;
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::comparison_error::ComparisonError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::face_image::FaceImage;

/// Runs `f` and reports its wall time under `stage`.
pub fn timed<T>(logger: &mut dyn PipelineLogger, stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    logger.timing(stage, start.elapsed().as_secs_f64() * 1000.0);
    out
}

pub fn load(
    loader: &dyn ImageLoader,
    side: ImageSide,
    source: &ImageSource,
) -> Result<FaceImage, ComparisonError> {
    loader
        .load(source)
        .map_err(|source| ComparisonError::ImageLoad { side, source })
}

pub fn detect(
    detector: &dyn FaceDetector,
    side: ImageSide,
    image: &FaceImage,
    options: &DetectionOptions,
) -> Result<Vec<DetectedFace>, ComparisonError> {
    detector
        .detect(image, options)
        .map_err(|e| ComparisonError::Detection {
            side,
            message: e.0,
        })
}

pub fn crop(
    side: ImageSide,
    image: &FaceImage,
    bbox: &BoundingBox,
) -> Result<FaceImage, ComparisonError> {
    face_cropper::crop(image, bbox).map_err(|source| ComparisonError::Process { side, source })
}

pub fn embed(
    embedder: &dyn EmbeddingProvider,
    side: ImageSide,
    face: &FaceImage,
) -> Result<Embedding, ComparisonError> {
    embedder.embed(face).map_err(|e| ComparisonError::Embed {
        side,
        message: e.0,
    })
}

/// Load, detect, require one face, crop, embed: the path a single reference
/// image takes. Each buffer is dropped as soon as the next stage has what it
/// needs.
pub fn embed_single_face(
    loader: &dyn ImageLoader,
    detector: &dyn FaceDetector,
    embedder: &dyn EmbeddingProvider,
    options: &DetectionOptions,
    source: &ImageSource,
    logger: &mut dyn PipelineLogger,
) -> Result<Embedding, ComparisonError> {
    let side = ImageSide::First;
    let image = timed(logger, "load", || load(loader, side, source))?;
    let faces = timed(logger, "detect", || detect(detector, side, &image, options))?;
    logger.metric("faces", faces.len() as f64);
    let bbox = single_face(side, &faces)?;

    let face = crop(side, &image, &bbox)?;
    drop(image);

    let embedding = timed(logger, "embed", || embed(embedder, side, &face))?;
    drop(face);
    Ok(embedding)
}
