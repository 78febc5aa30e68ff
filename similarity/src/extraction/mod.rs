//! Element extraction, resolved once per exercise kind.
//!
//! Each supported kind maps a submission's raw `content` to an ordered list of
//! [`Element`]s whose references are unique within that submission.

mod modeling;
mod text;

use crate::error::SimilarityError;
use db::models::{exercise::ExerciseKind, Element, Submission};

pub use modeling::extract_model_elements;
pub use text::extract_text_blocks;

/// Splits a submission into comparable elements according to the exercise kind.
pub trait Extract {
    fn extract(&self, submission: &Submission) -> Result<Vec<Element>, SimilarityError>;
}

impl Extract for ExerciseKind {
    fn extract(&self, submission: &Submission) -> Result<Vec<Element>, SimilarityError> {
        let content = match submission.content.as_deref() {
            Some(content) if !content.trim().is_empty() => content,
            _ => return Ok(Vec::new()),
        };

        match self {
            ExerciseKind::Modeling { .. } => extract_model_elements(submission.id, content),
            ExerciseKind::Text => Ok(extract_text_blocks(content)),
            ExerciseKind::FileUpload | ExerciseKind::Programming => {
                Err(SimilarityError::UnsupportedExercise {
                    exercise_id: submission.exercise_id,
                    kind: kind_name(self).to_string(),
                })
            }
        }
    }
}

pub(crate) fn kind_name(kind: &ExerciseKind) -> &'static str {
    match kind {
        ExerciseKind::Modeling { .. } => "modeling",
        ExerciseKind::Text => "text",
        ExerciseKind::FileUpload => "file_upload",
        ExerciseKind::Programming => "programming",
    }
}
