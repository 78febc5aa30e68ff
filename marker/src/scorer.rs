//! # Scorer Module
//!
//! Turns the feedback of a result into a percentage score for its exercise.
//!
//! ## Formula
//!
//! - `raw` is the sum of all feedback credits, unset credits counting as zero.
//! - `percent = raw / max_points * 100`.
//! - The score is `percent` clamped to `[0, ceiling]`, where the ceiling is
//!   `(max_points + bonus_points) / max_points * 100` for exercises included completely
//!   or as bonus, and `100` otherwise.
//!
//! ```
//! use db::test_utils::class_exercise;
//! use marker::scorer::score_for_credits;
//!
//! let mut exercise = class_exercise(1, 1);
//! exercise.bonus_points = 10.0;
//! assert_eq!(score_for_credits(&exercise, 15.0).unwrap(), 150.0);
//! assert_eq!(score_for_credits(&exercise, 25.0).unwrap(), 200.0);
//! assert_eq!(score_for_credits(&exercise, -3.0).unwrap(), 0.0);
//! ```

use crate::error::AssessmentError;
use db::models::{exercise::IncludedInOverallScore, Exercise, Feedback};

/// Round a float to two decimal places.
#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn total_credits(feedbacks: &[Feedback]) -> f64 {
    feedbacks.iter().map(Feedback::credits_or_zero).sum()
}

/// Highest reachable score in percent, bonus included.
pub fn score_ceiling(exercise: &Exercise) -> f64 {
    match exercise.included_in_overall_score {
        IncludedInOverallScore::IncludedCompletely | IncludedInOverallScore::IncludedAsBonus => {
            (exercise.max_points + exercise.bonus_points.max(0.0)) / exercise.max_points * 100.0
        }
        IncludedInOverallScore::NotIncluded => 100.0,
    }
}

/// Score in percent for a credit total.
///
/// Fails with [`AssessmentError::InvalidExercise`] when the exercise has no course or
/// no positive point maximum, since neither the ratio nor the ceiling exists then.
pub fn score_for_credits(exercise: &Exercise, credits: f64) -> Result<f64, AssessmentError> {
    if exercise.course_id.is_none() {
        return Err(AssessmentError::InvalidExercise(format!(
            "Exercise {} is not linked to a course",
            exercise.id
        )));
    }
    if exercise.max_points.is_nan() || exercise.max_points <= 0.0 {
        return Err(AssessmentError::InvalidExercise(format!(
            "Exercise {} has no positive maximum points",
            exercise.id
        )));
    }

    let percent = credits / exercise.max_points * 100.0;
    Ok(round2(percent.clamp(0.0, score_ceiling(exercise))))
}

pub fn calculate_score(exercise: &Exercise, feedbacks: &[Feedback]) -> Result<f64, AssessmentError> {
    score_for_credits(exercise, total_credits(feedbacks))
}
