use serde::{Deserialize, Serialize};

/// Identity signature of one face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean distance, accumulated in f64.
    ///
    /// # Panics
    ///
    /// If the embeddings differ in length. That only happens when two
    /// different models produced them, which is a wiring bug.
    pub fn euclidean_distance(&self, other: &Embedding) -> f64 {
        assert_eq!(
            self.len(),
            other.len(),
            "embedding length mismatch: {} vs {}",
            self.len(),
            other.len()
        );
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let d = *a as f64 - *b as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Copy scaled to unit length; the zero vector stays zero.
    pub fn l2_normalized(&self) -> Embedding {
        let norm = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            Embedding(self.0.iter().map(|x| x / norm).collect())
        } else {
            self.clone()
        }
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}
