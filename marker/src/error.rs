//! # Assessment Error Types
//!
//! This module defines [`AssessmentError`], the single error type surfaced by the
//! assessment engine to its collaborators. Every failure falls into one of six
//! categories; lower level errors from storage and clustering are folded into them
//! through `From` conversions so callers can use `?` throughout.
//!
//! The "no suggestion" outcome of the suggestion engine is not an error and never
//! appears here.

use common::format_validation_errors;
use db::StoreError;
use similarity::SimilarityError;
use validator::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    /// Unknown exercise, submission or result.
    #[error("{0} not found")]
    NotFound(String),

    /// Lock ownership or privilege violation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The round is locked or completed by someone else.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Assessor {assessor_id} already holds {open} of at most {max} open assessments")]
    QuotaExceeded {
        assessor_id: i64,
        open: usize,
        max: usize,
    },

    /// Missing course or point configuration, or an exercise kind without elements.
    #[error("Invalid exercise: {0}")]
    InvalidExercise(String),

    /// Malformed feedback or request parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AssessmentError {
    /// Suggested HTTP status for transports that expose the engine.
    pub fn status_code(&self) -> u16 {
        match self {
            AssessmentError::NotFound(_) => 404,
            AssessmentError::Forbidden(_) => 403,
            AssessmentError::Conflict(_) => 409,
            AssessmentError::QuotaExceeded { .. } => 429,
            AssessmentError::InvalidExercise(_) => 422,
            AssessmentError::BadRequest(_) => 400,
        }
    }
}

impl From<SimilarityError> for AssessmentError {
    fn from(err: SimilarityError) -> Self {
        match err {
            SimilarityError::UnknownExercise(id) => {
                AssessmentError::NotFound(format!("Exercise {id}"))
            }
            SimilarityError::UnknownSubmission(id) => {
                AssessmentError::NotFound(format!("Submission {id}"))
            }
            SimilarityError::UnsupportedExercise { .. } => {
                AssessmentError::InvalidExercise(err.to_string())
            }
            SimilarityError::MalformedModel { .. } => AssessmentError::BadRequest(err.to_string()),
        }
    }
}

impl From<StoreError> for AssessmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownSubmission(id) => {
                AssessmentError::NotFound(format!("Submission {id}"))
            }
            StoreError::UnknownExercise(id) => AssessmentError::NotFound(format!("Exercise {id}")),
            StoreError::DuplicateResult { .. } => AssessmentError::Conflict(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AssessmentError {
    fn from(errors: ValidationErrors) -> Self {
        AssessmentError::BadRequest(format_validation_errors(&errors))
    }
}
