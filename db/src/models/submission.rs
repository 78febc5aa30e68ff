use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participation's submitted work for one exercise.
///
/// `content` is the raw, exercise-kind specific payload (model JSON, text, ...).
/// Elements are derived from it on demand and never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub exercise_id: i64,
    pub participation_id: i64,
    pub submitted: bool,
    pub submission_date: Option<DateTime<Utc>>,
    pub content: Option<String>,
}
