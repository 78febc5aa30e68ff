//! # MajorityAgreement Policy
//!
//! Groups samples by their exact credit value (unset credits form their own group) and
//! picks the largest group, the first one encountered winning ties. A representative is
//! produced only when
//!
//! - the majority credits are set,
//! - the majority makes up at least `min_agreement_ratio` of all samples, and
//! - at least `min_agreeing_count` samples are in the majority.
//!
//! Its text is the longest one among the agreeing samples, the earliest winning ties.

use crate::traits::confidence::{ConfidencePolicy, FeedbackSample};
use common::AssessmentConfig;
use similarity::Representative;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MajorityAgreement {
    pub min_agreement_ratio: f64,
    pub min_agreeing_count: usize,
}

impl Default for MajorityAgreement {
    fn default() -> Self {
        Self {
            min_agreement_ratio: 0.8,
            min_agreeing_count: 1,
        }
    }
}

impl From<&AssessmentConfig> for MajorityAgreement {
    fn from(config: &AssessmentConfig) -> Self {
        Self {
            min_agreement_ratio: config.min_agreement_ratio,
            min_agreeing_count: config.min_agreeing_count,
        }
    }
}

impl ConfidencePolicy for MajorityAgreement {
    fn evaluate(&self, samples: &[FeedbackSample]) -> Option<Representative> {
        if samples.is_empty() {
            return None;
        }

        let mut groups: Vec<(Option<f64>, Vec<&FeedbackSample>)> = Vec::new();
        for sample in samples {
            match groups.iter_mut().find(|(credits, _)| *credits == sample.credits) {
                Some((_, members)) => members.push(sample),
                None => groups.push((sample.credits, vec![sample])),
            }
        }

        let mut majority = &groups[0];
        for group in &groups[1..] {
            if group.1.len() > majority.1.len() {
                majority = group;
            }
        }

        let (credits, agreeing) = majority;
        let credits = (*credits)?;
        let confidence = agreeing.len() as f64 / samples.len() as f64;
        if confidence < self.min_agreement_ratio || agreeing.len() < self.min_agreeing_count {
            return None;
        }

        let mut text: Option<&String> = None;
        for sample in agreeing {
            if let Some(candidate) = &sample.text {
                if text.is_none_or(|t| candidate.chars().count() > t.chars().count()) {
                    text = Some(candidate);
                }
            }
        }

        let first_instruction = agreeing[0].grading_instruction_id;
        let grading_instruction_id = agreeing
            .iter()
            .all(|s| s.grading_instruction_id == first_instruction)
            .then_some(first_instruction)
            .flatten();

        Some(Representative {
            credits,
            text: text.cloned(),
            grading_instruction_id,
            confidence,
        })
    }
}
