use chrono::{DateTime, Utc};
use db::models::{result::AssessmentType, Feedback};
use serde::Serialize;

/// An unsaved result proposed for a submission from its similarity sets.
///
/// It is never persisted as is. Locking a submission copies its feedback into the new
/// open result, and the score is recomputed whenever it is asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub submission_id: i64,
    pub exercise_id: i64,
    /// One `AUTOMATIC` feedback per element whose set has a representative.
    pub feedbacks: Vec<Feedback>,
    pub score: f64,
    pub assessment_type: AssessmentType,
    pub rated: Option<bool>,
    pub assessor_id: Option<i64>,
    pub completion_date: Option<DateTime<Utc>>,
}
