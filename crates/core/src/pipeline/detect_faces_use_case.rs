use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detection_coordinator::ImageSide;
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::FaceDetector;
use crate::imaging::domain::image_loader::ImageLoader;
use crate::imaging::domain::image_source::ImageSource;
use crate::pipeline::comparison_error::ComparisonError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::stages::{detect, load, timed};

/// Single-image detection: load → detect, returning every face found.
pub struct DetectFacesUseCase {
    loader: Box<dyn ImageLoader>,
    detector: Box<dyn FaceDetector>,
    options: DetectionOptions,
    logger: Box<dyn PipelineLogger>,
}

impl DetectFacesUseCase {
    pub fn new(
        loader: Box<dyn ImageLoader>,
        detector: Box<dyn FaceDetector>,
        options: DetectionOptions,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            loader,
            detector,
            options,
            logger,
        }
    }

    pub fn execute(&mut self, source: &ImageSource) -> Result<Vec<DetectedFace>, ComparisonError> {
        self.options
            .validate()
            .map_err(|e| ComparisonError::Prepare(e.to_string()))?;

        let loader = self.loader.as_ref();
        let detector = self.detector.as_ref();
        let options = &self.options;
        let logger = self.logger.as_mut();

        let image = timed(logger, "load", || load(loader, ImageSide::First, source))?;
        let faces = timed(logger, "detect", || {
            detect(detector, ImageSide::First, &image, options)
        })?;
        drop(image);

        logger.metric("faces", faces.len() as f64);
        logger.info(&format!("Found {} face(s) in {source}", faces.len()));
        logger.summary();
        Ok(faces)
    }
}
