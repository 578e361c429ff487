/// Face embedding provider using ONNX Runtime.
///
/// Resizes the crop to the model's square input, normalizes pixels with
/// the model's mean/std and returns the first output tensor as the
/// embedding.
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::embedding::domain::embedding::Embedding;
use crate::embedding::domain::embedding_provider::{EmbedError, EmbeddingProvider};
use crate::shared::face_image::FaceImage;
use crate::shared::onnx_session::open_session;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    Nchw,
    Nhwc,
}

/// Input contract of an embedding model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingModelConfig {
    pub input_size: usize,
    pub mean: f32,
    pub std: f32,
    pub layout: TensorLayout,
    /// Scale outputs to unit length before comparison.
    pub normalize: bool,
}

impl EmbeddingModelConfig {
    /// InsightFace ArcFace (`w600k_r50`): 112x112 NCHW, 512-d output.
    pub const ARCFACE: EmbeddingModelConfig = EmbeddingModelConfig {
        input_size: 112,
        mean: 127.5,
        std: 127.5,
        layout: TensorLayout::Nchw,
        normalize: true,
    };

    /// MobileFaceNet exports: 112x112 NHWC, 192-d output, raw distances.
    pub const MOBILEFACENET: EmbeddingModelConfig = EmbeddingModelConfig {
        input_size: 112,
        mean: 128.0,
        std: 128.0,
        layout: TensorLayout::Nhwc,
        normalize: false,
    };
}

impl Default for EmbeddingModelConfig {
    fn default() -> Self {
        Self::ARCFACE
    }
}

pub struct OnnxEmbeddingProvider {
    session: Mutex<ort::session::Session>,
    config: EmbeddingModelConfig,
}

impl OnnxEmbeddingProvider {
    pub fn new(
        model_path: &Path,
        config: EmbeddingModelConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = open_session(model_path)?;
        Ok(Self {
            session: Mutex::new(session),
            config,
        })
    }

    fn embed_inner(&self, face: &FaceImage) -> Result<Embedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(face, &self.config);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let values: Vec<f32> = embedding_array.iter().copied().collect();
        if values.is_empty() {
            return Err("Embedding model produced an empty output".into());
        }

        let embedding = Embedding::new(values);
        Ok(if self.config.normalize {
            embedding.l2_normalized()
        } else {
            embedding
        })
    }
}

impl EmbeddingProvider for OnnxEmbeddingProvider {
    fn embed(&self, face: &FaceImage) -> Result<Embedding, EmbedError> {
        if face.width() == 0 || face.height() == 0 {
            return Err(EmbedError("face crop is empty".to_string()));
        }
        Ok(self.embed_inner(face)?)
    }
}

/// Nearest-neighbour resize to the model input, normalized, in the model's
/// tensor layout. Always produces a 4-D tensor with batch size 1.
fn preprocess(face: &FaceImage, config: &EmbeddingModelConfig) -> ndarray::Array4<f32> {
    let size = config.input_size;
    let src_w = face.width() as usize;
    let src_h = face.height() as usize;
    let channels = (face.channels() as usize).max(1);
    let data = face.data();

    let shape = match config.layout {
        TensorLayout::Nchw => (1, 3, size, size),
        TensorLayout::Nhwc => (1, size, size, 3),
    };
    let mut tensor = ndarray::Array4::<f32>::zeros(shape);

    for y in 0..size {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / size as f64) as usize).min(src_h - 1);
        for x in 0..size {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / size as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * channels;
            for c in 0..3 {
                let value = data[offset + c.min(channels - 1)] as f32;
                let normalized = (value - config.mean) / config.std;
                match config.layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = normalized,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = normalized,
                }
            }
        }
    }

    tensor
}
