use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::domain::detection_options::DetectionOptions;
use crate::embedding::infrastructure::onnx_embedding_provider::EmbeddingModelConfig;
use crate::pipeline::comparison_error::ComparisonError;
use crate::shared::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DISTANCE_THRESHOLD};

/// Tunables for a pipeline run, loadable from a JSON file.
///
/// Missing fields fall back to their defaults, so a config file only needs
/// the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Euclidean distance below which two faces match.
    pub threshold: f64,
    pub detection: DetectionOptions,
    pub embedding: EmbeddingModelConfig,
    /// Directory searched for model files before the download cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
    /// Explicit embedding model file, overriding the bundled one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DISTANCE_THRESHOLD,
            detection: DetectionOptions::default(),
            embedding: EmbeddingModelConfig::default(),
            model_dir: None,
            embedding_model: None,
        }
    }
}

impl PipelineConfig {
    /// `<config dir>/FaceMatch/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ComparisonError> {
        let json = fs::read_to_string(path).map_err(|e| {
            ComparisonError::Prepare(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: PipelineConfig = serde_json::from_str(&json).map_err(|e| {
            ComparisonError::Prepare(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads the config at the default location, or defaults when there is
    /// none.
    pub fn load_or_default() -> Result<Self, ComparisonError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ComparisonError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ComparisonError::Prepare(format!(
                "threshold must be a positive number, got {}",
                self.threshold
            )));
        }
        if self.embedding.input_size == 0 {
            return Err(ComparisonError::Prepare(
                "embedding input size must be positive".to_string(),
            ));
        }
        if self.embedding.std == 0.0 {
            return Err(ComparisonError::Prepare(
                "embedding std must be non-zero".to_string(),
            ));
        }
        self.detection
            .validate()
            .map_err(|e| ComparisonError::Prepare(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::infrastructure::onnx_embedding_provider::TensorLayout;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!((config.threshold - DISTANCE_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(config.detection, DetectionOptions::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"threshold": 1.1, "detection": {"confidence": 0.7}, "embedding": {"input_size": 112, "mean": 128.0, "std": 128.0, "layout": "nhwc", "normalize": false}}"#,
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert!((config.threshold - 1.1).abs() < f64::EPSILON);
        assert!((config.detection.confidence - 0.7).abs() < f64::EPSILON);
        assert!(!config.detection.landmarks);
        assert_eq!(config.embedding.layout, TensorLayout::Nhwc);
        assert_eq!(config.model_dir, None);
    }

    #[test]
    fn test_missing_file_is_prepare_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PipelineConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.category(), "PREPARE_ERROR");
    }

    #[test]
    fn test_malformed_file_is_prepare_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{threshold:").unwrap();
        assert_eq!(
            PipelineConfig::load(&path).unwrap_err().category(),
            "PREPARE_ERROR"
        );
    }

    #[rstest]
    #[case::zero_threshold(0.0, 0.5)]
    #[case::negative_threshold(-1.0, 0.5)]
    #[case::nan_threshold(f64::NAN, 0.5)]
    #[case::bad_confidence(0.9, 1.5)]
    fn test_validate_rejects(#[case] threshold: f64, #[case] confidence: f64) {
        let mut config = PipelineConfig {
            threshold,
            ..Default::default()
        };
        config.detection.confidence = confidence;
        assert!(matches!(
            config.validate(),
            Err(ComparisonError::Prepare(_))
        ));
    }
}
