use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A user's role within a course, ordered from least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Student,
    Tutor,
    Editor,
    Instructor,
}

/// Membership of a user in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub user_id: i64,
    pub course_id: i64,
    pub role: Role,
}
