use serde::{Deserialize, Serialize};

use crate::embedding::domain::embedding::Embedding;
use crate::shared::constants::DISTANCE_THRESHOLD;

/// Verdict for one pair of embeddings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(rename = "match")]
    pub is_match: bool,
    /// `1 - distance` clamped to [0, 1], three decimal places.
    pub similarity: String,
    pub distance: f64,
}

/// Decides whether two embeddings belong to the same person.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceComparator {
    threshold: f64,
}

impl FaceComparator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Panics if the embeddings differ in length.
    pub fn compare(&self, a: &Embedding, b: &Embedding) -> ComparisonResult {
        let distance = a.euclidean_distance(b);
        ComparisonResult {
            is_match: self.is_match(distance),
            similarity: format_similarity(distance),
            distance,
        }
    }

    /// Matches are strictly below the threshold.
    pub fn is_match(&self, distance: f64) -> bool {
        distance < self.threshold
    }
}

impl Default for FaceComparator {
    fn default() -> Self {
        Self::new(DISTANCE_THRESHOLD)
    }
}

/// Compares with the default threshold.
pub fn compare(a: &Embedding, b: &Embedding) -> ComparisonResult {
    FaceComparator::default().compare(a, b)
}

/// `1 - distance` clamped to [0, 1]. A non-finite distance scores 0.
pub fn format_similarity(distance: f64) -> String {
    let similarity = if distance.is_finite() {
        (1.0 - distance).clamp(0.0, 1.0)
    } else {
        0.0
    };
    format!("{similarity:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn test_identical_embeddings_match_fully() {
        let a = emb(&[0.3, -0.2, 0.9]);
        let result = compare(&a, &a.clone());
        assert!(result.is_match);
        assert_eq!(result.similarity, "1.000");
        assert_relative_eq!(result.distance, 0.0);
    }

    #[test]
    fn test_comparison_is_symmetric() {
        let a = emb(&[0.1, 0.5, -0.4, 0.2]);
        let b = emb(&[0.3, -0.1, 0.0, 0.7]);
        assert_eq!(compare(&a, &b), compare(&b, &a));
    }

    #[test]
    fn test_distance_at_threshold_is_not_a_match() {
        let comparator = FaceComparator::new(0.5);
        let result = comparator.compare(&emb(&[0.0]), &emb(&[0.5]));
        assert_relative_eq!(result.distance, 0.5);
        assert!(!result.is_match);
        assert_eq!(result.similarity, "0.500");
    }

    #[test]
    fn test_distance_just_below_threshold_matches() {
        let comparator = FaceComparator::new(0.5);
        assert!(comparator.compare(&emb(&[0.0]), &emb(&[0.25])).is_match);
    }

    #[test]
    fn test_scenario_distance_is_reported() {
        // 3-4-5 triangle scaled by 0.1
        let result = compare(&emb(&[0.0, 0.0]), &emb(&[0.3, 0.4]));
        assert_relative_eq!(result.distance, 0.5, epsilon = 1e-6);
        assert!(result.is_match);
        assert_eq!(result.similarity, "0.500");
    }

    #[test]
    fn test_far_embeddings_do_not_match() {
        let result = compare(&emb(&[0.0, 0.0]), &emb(&[1.2, 0.9]));
        assert_relative_eq!(result.distance, 1.5, epsilon = 1e-6);
        assert!(!result.is_match);
        assert_eq!(result.similarity, "0.000");
    }

    #[rstest]
    #[case::zero(0.0, "1.000")]
    #[case::rounds(0.1234, "0.877")]
    #[case::at_one(1.0, "0.000")]
    #[case::beyond_one(2.7, "0.000")]
    #[case::nan(f64::NAN, "0.000")]
    #[case::infinite(f64::INFINITY, "0.000")]
    fn test_format_similarity(#[case] distance: f64, #[case] expected: &str) {
        assert_eq!(format_similarity(distance), expected);
    }

    #[test]
    fn test_nan_embedding_is_not_a_match() {
        let result = compare(&emb(&[f32::NAN, 0.0]), &emb(&[0.0, 0.0]));
        assert!(!result.is_match);
        assert_eq!(result.similarity, "0.000");
    }

    #[test]
    #[should_panic(expected = "embedding length mismatch")]
    fn test_length_mismatch_panics() {
        compare(&emb(&[0.0, 1.0]), &emb(&[0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_default_threshold() {
        assert_relative_eq!(FaceComparator::default().threshold(), DISTANCE_THRESHOLD);
    }

    #[test]
    fn test_result_serializes_with_match_key() {
        let result = ComparisonResult {
            is_match: true,
            similarity: "0.750".into(),
            distance: 0.25,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"match": true, "similarity": "0.750", "distance": 0.25})
        );
    }
}
