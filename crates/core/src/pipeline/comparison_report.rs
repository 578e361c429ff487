use serde::{Deserialize, Serialize};

use crate::comparison::domain::face_comparator::ComparisonResult;
use crate::pipeline::comparison_error::ComparisonError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub category: String,
    pub message: String,
}

impl From<&ComparisonError> for ErrorReport {
    fn from(e: &ComparisonError) -> Self {
        Self {
            category: e.category().to_string(),
            message: e.to_string(),
        }
    }
}

/// Boundary shape of one comparison: either the verdict or the error,
/// never both.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComparisonReport {
    Verdict(ComparisonResult),
    Failure { error: ErrorReport },
}

impl ComparisonReport {
    pub fn is_error(&self) -> bool {
        matches!(self, ComparisonReport::Failure { .. })
    }
}

impl From<Result<ComparisonResult, ComparisonError>> for ComparisonReport {
    fn from(outcome: Result<ComparisonResult, ComparisonError>) -> Self {
        match outcome {
            Ok(result) => ComparisonReport::Verdict(result),
            Err(e) => ComparisonReport::Failure {
                error: ErrorReport::from(&e),
            },
        }
    }
}
