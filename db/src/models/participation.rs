use serde::{Deserialize, Serialize};

/// Who owns a participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Owner {
    Student(i64),
    Team(i64),
}

/// A student's (or team's) enrolment in one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub exercise_id: i64,
    pub owner: Owner,
}
