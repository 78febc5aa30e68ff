//!
//! # Confidence Policy Trait
//!
//! This module defines the [`ConfidencePolicy`] trait and the [`FeedbackSample`] struct.
//! A policy looks at the assessor-written feedback collected from every member of a
//! similarity set and decides whether the set is trustworthy enough to suggest automatic
//! feedback for the elements that have not been graded yet.
//!

use similarity::Representative;

/// One piece of assessor-written feedback on a similarity set member.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSample {
    pub submission_id: i64,
    pub credits: Option<f64>,
    pub text: Option<String>,
    pub grading_instruction_id: Option<i64>,
}

/// A trait for pluggable confidence policies.
///
/// # Arguments
/// - `samples`: feedback of the set's members, in member insertion order.
///
/// # Returns
/// - `Some(Representative)`: the feedback to suggest for every unassessed member.
/// - `None`: the samples do not agree enough; the set produces no suggestion.
pub trait ConfidencePolicy: Send + Sync {
    fn evaluate(&self, samples: &[FeedbackSample]) -> Option<Representative>;
}
