use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Feedback as submitted by an assessor, before it is classified.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct FeedbackInput {
    #[validate(custom(function = "validate_credits"))]
    pub credits: Option<f64>,

    pub text: Option<String>,

    /// Element reference; `None` for general remarks.
    #[validate(length(min = 1, message = "Element reference must not be empty"))]
    pub reference: Option<String>,

    pub grading_instruction_id: Option<i64>,
}

impl FeedbackInput {
    pub fn referenced(reference: &str, credits: f64, text: &str) -> Self {
        Self {
            credits: Some(credits),
            text: Some(text.to_string()),
            reference: Some(reference.to_string()),
            grading_instruction_id: None,
        }
    }

    pub fn unreferenced(credits: f64, text: &str) -> Self {
        Self {
            credits: Some(credits),
            text: Some(text.to_string()),
            reference: None,
            grading_instruction_id: None,
        }
    }
}

fn validate_credits(credits: f64) -> Result<(), ValidationError> {
    if credits.is_finite() {
        Ok(())
    } else {
        let mut err = ValidationError::new("credits_not_finite");
        err.message = Some("Credits must be a finite number".into());
        Err(err)
    }
}
