//! # Override Reconciliation
//!
//! Assessors always submit the complete feedback list of a result. Each incoming entry
//! is classified against the feedback the result held before:
//!
//! | previous entry on the element | incoming entry        | stored as             |
//! |-------------------------------|-----------------------|-----------------------|
//! | `AUTOMATIC`                   | same credits and text | `AUTOMATIC`           |
//! | `AUTOMATIC`                   | changed               | `AUTOMATIC_ADAPTED`   |
//! | `AUTOMATIC_ADAPTED`           | anything              | `AUTOMATIC_ADAPTED`   |
//! | none or `MANUAL`              | anything              | `MANUAL`              |
//! | (no element reference)        | anything              | `MANUAL_UNREFERENCED` |
//!
//! Only the result being submitted is touched. Feedback on other results is never
//! rewritten here; the effect on other submissions flows through the recomputed
//! similarity set representatives.

use super::input::FeedbackInput;
use crate::error::AssessmentError;
use db::models::{feedback::FeedbackType, Element, Feedback};
use std::collections::HashSet;
use validator::Validate;

pub fn reconcile_feedback(
    inputs: Vec<FeedbackInput>,
    elements: &[Element],
    previous: &[Feedback],
    max_text_length: usize,
) -> Result<Vec<Feedback>, AssessmentError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut reconciled = Vec::with_capacity(inputs.len());

    for input in inputs {
        input.validate()?;

        if let Some(text) = &input.text {
            let length = text.chars().count();
            if length > max_text_length {
                return Err(AssessmentError::BadRequest(format!(
                    "Feedback text has {length} characters, at most {max_text_length} are allowed"
                )));
            }
        }

        let feedback_type = match input.reference.as_deref() {
            None => FeedbackType::ManualUnreferenced,
            Some(reference) => {
                if !elements.iter().any(|e| e.reference == reference) {
                    return Err(AssessmentError::BadRequest(format!(
                        "Element '{reference}' does not exist in this submission"
                    )));
                }
                if !seen.insert(reference.to_string()) {
                    return Err(AssessmentError::BadRequest(format!(
                        "Element '{reference}' has more than one feedback"
                    )));
                }
                classify(&input, previous.iter().find(|f| f.reference.as_deref() == Some(reference)))
            }
        };

        reconciled.push(Feedback {
            credits: input.credits,
            text: input.text,
            feedback_type,
            reference: input.reference,
            grading_instruction_id: input.grading_instruction_id,
        });
    }

    Ok(reconciled)
}

fn classify(input: &FeedbackInput, previous: Option<&Feedback>) -> FeedbackType {
    match previous.map(|p| (p, p.feedback_type)) {
        Some((p, FeedbackType::Automatic)) => {
            if p.credits == input.credits && p.text == input.text {
                FeedbackType::Automatic
            } else {
                FeedbackType::AutomaticAdapted
            }
        }
        Some((_, FeedbackType::AutomaticAdapted)) => FeedbackType::AutomaticAdapted,
        _ => FeedbackType::Manual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements() -> Vec<Element> {
        ["Class:a", "Class:b", "Class:c", "Class:d"]
            .iter()
            .map(|r| Element::new(*r, "Class", *r, ""))
            .collect()
    }

    fn automatic(reference: &str, credits: f64, text: &str) -> Feedback {
        Feedback {
            credits: Some(credits),
            text: Some(text.to_string()),
            feedback_type: FeedbackType::Automatic,
            reference: Some(reference.to_string()),
            grading_instruction_id: None,
        }
    }

    #[test]
    fn test_override_classification() {
        let previous = vec![
            automatic("Class:a", 1.0, "fine"),
            automatic("Class:b", 1.0, "fine"),
            automatic("Class:c", 1.0, "fine"),
        ];
        let inputs = vec![
            FeedbackInput::referenced("Class:a", 2.0, "fine"),
            FeedbackInput::referenced("Class:b", 1.0, "different text"),
            FeedbackInput::referenced("Class:c", 1.0, "fine"),
            FeedbackInput::referenced("Class:d", 0.5, "new"),
            FeedbackInput::unreferenced(1.0, "general"),
        ];

        let types: Vec<_> = reconcile_feedback(inputs, &elements(), &previous, 100)
            .unwrap()
            .into_iter()
            .map(|f| f.feedback_type)
            .collect();
        assert_eq!(
            types,
            vec![
                FeedbackType::AutomaticAdapted,
                FeedbackType::AutomaticAdapted,
                FeedbackType::Automatic,
                FeedbackType::Manual,
                FeedbackType::ManualUnreferenced,
            ]
        );
    }

    #[test]
    fn test_adapted_stays_adapted() {
        let mut previous = automatic("Class:a", 1.0, "fine");
        previous.feedback_type = FeedbackType::AutomaticAdapted;
        let reconciled = reconcile_feedback(
            vec![FeedbackInput::referenced("Class:a", 1.0, "fine")],
            &elements(),
            &[previous],
            100,
        )
        .unwrap();
        assert_eq!(reconciled[0].feedback_type, FeedbackType::AutomaticAdapted);
    }

    #[test]
    fn test_unknown_reference_is_rejected() {
        let err = reconcile_feedback(
            vec![FeedbackInput::referenced("Class:zz", 1.0, "x")],
            &elements(),
            &[],
            100,
        )
        .unwrap_err();
        assert!(matches!(err, AssessmentError::BadRequest(_)));
    }

    #[test]
    fn test_duplicate_reference_is_rejected() {
        let inputs = vec![
            FeedbackInput::referenced("Class:a", 1.0, "x"),
            FeedbackInput::referenced("Class:a", 2.0, "y"),
        ];
        assert!(reconcile_feedback(inputs, &elements(), &[], 100).is_err());
    }

    #[test]
    fn test_text_length_limit() {
        let inputs = vec![FeedbackInput::unreferenced(1.0, "abcdef")];
        assert!(reconcile_feedback(inputs.clone(), &elements(), &[], 5).is_err());
        assert!(reconcile_feedback(inputs, &elements(), &[], 6).is_ok());
    }

    #[test]
    fn test_invalid_credits_are_bad_requests() {
        let err = reconcile_feedback(
            vec![FeedbackInput::unreferenced(f64::NAN, "x")],
            &elements(),
            &[],
            100,
        )
        .unwrap_err();
        assert_eq!(
            err,
            AssessmentError::BadRequest("Credits must be a finite number".into())
        );
    }
}
