use serde::{Deserialize, Serialize};

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::bounding_box::BoundingBox;

/// One face found in one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    /// Detector-assigned identity token, present when tracking is enabled.
    pub tracking_id: Option<u32>,
    pub confidence: f64,
    pub landmarks: Option<FaceLandmarks>,
}

impl DetectedFace {
    pub fn new(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            tracking_id: None,
            confidence: 1.0,
            landmarks: None,
        }
    }
}
