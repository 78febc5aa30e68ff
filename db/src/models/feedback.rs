use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Origin of a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FeedbackType {
    /// Written by an assessor against an element.
    Manual,
    /// Written by an assessor without an element reference.
    ManualUnreferenced,
    /// Copied unchanged from a similarity set's representative.
    Automatic,
    /// Started as automatic, then edited by an assessor.
    AutomaticAdapted,
}

impl FeedbackType {
    pub fn is_automatic(&self) -> bool {
        matches!(self, FeedbackType::Automatic | FeedbackType::AutomaticAdapted)
    }

    /// Feedback written (or confirmed) by a human, which is what suggestions learn from.
    pub fn is_assessor_authored(&self) -> bool {
        matches!(self, FeedbackType::Manual | FeedbackType::AutomaticAdapted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// May be negative; `None` is distinct from zero.
    pub credits: Option<f64>,
    pub text: Option<String>,
    pub feedback_type: FeedbackType,
    pub reference: Option<String>,
    /// Link to an externally managed grading instruction.
    pub grading_instruction_id: Option<i64>,
}

impl Model {
    pub fn credits_or_zero(&self) -> f64 {
        self.credits.unwrap_or(0.0)
    }
}
