use super::feedback;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AssessmentType {
    Automatic,
    SemiAutomatic,
    Manual,
}

impl AssessmentType {
    /// `SemiAutomatic` as soon as any automatic feedback survives, otherwise `Manual`.
    pub fn for_feedbacks(feedbacks: &[feedback::Model]) -> Self {
        if feedbacks.iter().any(|f| f.feedback_type.is_automatic()) {
            AssessmentType::SemiAutomatic
        } else {
            AssessmentType::Manual
        }
    }
}

/// One grading attempt for a (submission, correction round) pair.
///
/// A result whose `completion_date` is `None` is an open assessment lock held by
/// `assessor_id`. There is no separate lock entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub submission_id: i64,
    pub correction_round: i32,
    pub assessor_id: Option<i64>,
    pub score: Option<f64>,
    pub rated: Option<bool>,
    pub completion_date: Option<DateTime<Utc>>,
    pub assessment_type: Option<AssessmentType>,
    pub feedbacks: Vec<feedback::Model>,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.completion_date.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.completion_date.is_some()
    }

    pub fn is_assessed_by(&self, user_id: i64) -> bool {
        self.assessor_id == Some(user_id)
    }

    /// Feedback attached to the element `reference`, if any.
    pub fn feedback_for(&self, reference: &str) -> Option<&feedback::Model> {
        self.feedbacks
            .iter()
            .find(|f| f.reference.as_deref() == Some(reference))
    }
}
