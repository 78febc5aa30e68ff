//! Errors raised while extracting elements or maintaining similarity sets.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimilarityError {
    #[error("Exercise {0} does not exist")]
    UnknownExercise(i64),

    #[error("Submission {0} does not exist")]
    UnknownSubmission(i64),

    #[error("Exercise {exercise_id} of kind {kind} does not support automatic assessment")]
    UnsupportedExercise { exercise_id: i64, kind: String },

    #[error("Submission {submission_id} has a malformed model: {reason}")]
    MalformedModel { submission_id: i64, reason: String },
}
