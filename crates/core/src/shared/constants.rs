use crate::shared::model_resolver::ModelSpec;

pub const APP_DIR_NAME: &str = "FaceMatch";

pub const DETECTOR_MODEL: ModelSpec = ModelSpec {
    name: "yolo11n-pose_widerface.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx",
};

pub const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: "w600k_r50.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx",
};

/// Euclidean distance below which two embeddings are the same person.
///
/// Calibrated against the embedding model's output space; re-calibrate when
/// swapping models.
pub const DISTANCE_THRESHOLD: f64 = 0.9;

pub const GALLERY_FILE_NAME: &str = "gallery.json";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Name reported by identification when no gallery entry is close enough.
pub const UNKNOWN_FACE: &str = "unknown";
