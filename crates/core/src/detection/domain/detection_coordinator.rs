//! Concurrent face detection over an image pair.
//!
//! Both detections are in flight at the same time on scoped threads and
//! report back over a channel. The first failure decides the outcome and
//! the other side's result is discarded; both threads are always joined
//! before returning so nothing outlives the borrowed images.

use std::fmt;
use std::thread;

use serde::Serialize;
use thiserror::Error;

use crate::detection::domain::detected_face::DetectedFace;
use crate::detection::domain::detection_options::DetectionOptions;
use crate::detection::domain::face_detector::{DetectionError, FaceDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::face_image::FaceImage;

/// Which of the two compared images a result or failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ImageSide {
    First,
    Second,
}

impl ImageSide {
    pub const BOTH: [ImageSide; 2] = [ImageSide::First, ImageSide::Second];

    pub fn number(self) -> u8 {
        match self {
            ImageSide::First => 1,
            ImageSide::Second => 2,
        }
    }
}

impl fmt::Display for ImageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image {}", self.number())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum CoordinatorError {
    #[error("face detection failed for {side}: {message}")]
    DetectionFailed { side: ImageSide, message: String },
    #[error("{side} must contain exactly one face; found {count}")]
    FaceCount { side: ImageSide, count: usize },
}

/// Detects faces in both images concurrently and returns the single face
/// box of each.
///
/// Fails with [`CoordinatorError::DetectionFailed`] if either detection
/// fails, and with [`CoordinatorError::FaceCount`] if either image does not
/// contain exactly one face (the first image is checked first).
pub fn detect_single_faces(
    first: &FaceImage,
    second: &FaceImage,
    detector: &dyn FaceDetector,
    options: &DetectionOptions,
) -> Result<(BoundingBox, BoundingBox), CoordinatorError> {
    let (first_faces, second_faces) = detect_pair(first, second, detector, options)?;
    log::debug!(
        "Detected {} face(s) in image 1 and {} face(s) in image 2",
        first_faces.len(),
        second_faces.len()
    );

    let first_box = single_face(ImageSide::First, &first_faces)?;
    let second_box = single_face(ImageSide::Second, &second_faces)?;
    Ok((first_box, second_box))
}

/// Runs both detections and waits for both, or for the first failure.
pub fn detect_pair(
    first: &FaceImage,
    second: &FaceImage,
    detector: &dyn FaceDetector,
    options: &DetectionOptions,
) -> Result<(Vec<DetectedFace>, Vec<DetectedFace>), CoordinatorError> {
    type SideResult = (ImageSide, Result<Vec<DetectedFace>, DetectionError>);
    let (tx, rx) = crossbeam_channel::bounded::<SideResult>(2);

    thread::scope(|scope| {
        let handles: Vec<_> = ImageSide::BOTH
            .into_iter()
            .zip([first, second])
            .map(|(side, image)| {
                let tx = tx.clone();
                let handle = scope.spawn(move || {
                    let result = detector.detect(image, options);
                    let _ = tx.send((side, result));
                });
                (side, handle)
            })
            .collect();
        drop(tx);

        let mut first_faces = None;
        let mut second_faces = None;
        let mut failure = None;

        for (side, result) in rx.iter() {
            match result {
                Ok(faces) => match side {
                    ImageSide::First => first_faces = Some(faces),
                    ImageSide::Second => second_faces = Some(faces),
                },
                Err(e) => {
                    log::warn!("Face detection failed for {side}: {}", e.0);
                    failure = Some(CoordinatorError::DetectionFailed {
                        side,
                        message: e.0,
                    });
                    break;
                }
            }
        }

        for (side, handle) in handles {
            if handle.join().is_err() && failure.is_none() {
                failure = Some(CoordinatorError::DetectionFailed {
                    side,
                    message: "detector panicked".to_string(),
                });
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        match (first_faces, second_faces) {
            (Some(a), Some(b)) => Ok((a, b)),
            (None, _) => Err(missing_result(ImageSide::First)),
            (_, None) => Err(missing_result(ImageSide::Second)),
        }
    })
}

fn missing_result(side: ImageSide) -> CoordinatorError {
    CoordinatorError::DetectionFailed {
        side,
        message: "detector returned no result".to_string(),
    }
}

/// Enforces the one-face-per-image rule.
pub fn single_face(side: ImageSide, faces: &[DetectedFace]) -> Result<BoundingBox, CoordinatorError> {
    match faces {
        [face] => Ok(face.bounding_box),
        _ => Err(CoordinatorError::FaceCount {
            side,
            count: faces.len(),
        }),
    }
}
