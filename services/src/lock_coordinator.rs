//! Lock and correction-round coordination.
//!
//! Every `(submission, correction round)` pair moves through
//! `Unassessed -> Locked(assessor) -> Completed`, where a lock is simply an open result.
//! All operations take the store tables by reference; callers hold the store write guard
//! for the whole operation, which makes "check quota, then create the result" one atomic
//! step.

use crate::access_policy::AccessPolicy;
use chrono::{DateTime, Utc};
use db::models::{result::AssessmentType, AssessmentResult, Exercise, Feedback, Submission};
use db::Tables;
use log::{debug, info, warn};
use marker::feedback::{reconcile_feedback, FeedbackInput};
use marker::scorer::calculate_score;
use marker::{AssessmentError, SuggestionEngine};
use serde::Serialize;
use std::sync::Arc;

/// A submission handed out for assessment, with its new lock if one was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockedSubmission {
    pub submission: Submission,
    pub result: Option<AssessmentResult>,
}

/// How far one correction round of an exercise has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoundProgress {
    pub submitted: usize,
    pub locked: usize,
    pub assessed: usize,
}

pub struct LockCoordinator {
    engine: Arc<SuggestionEngine>,
    access: Arc<dyn AccessPolicy>,
    max_locks_per_assessor: usize,
    max_feedback_text_length: usize,
}

impl LockCoordinator {
    pub fn new(
        engine: Arc<SuggestionEngine>,
        access: Arc<dyn AccessPolicy>,
        max_locks_per_assessor: usize,
        max_feedback_text_length: usize,
    ) -> Self {
        Self {
            engine,
            access,
            max_locks_per_assessor,
            max_feedback_text_length,
        }
    }

    /// Hands out the lowest-id submitted submission without a result for `round`.
    ///
    /// With `lock`, an open result owned by `caller` is created in the same step,
    /// prefilled with reusable feedback.
    pub async fn lock_next_unassessed(
        &self,
        tables: &mut Tables,
        exercise_id: i64,
        round: i32,
        caller: i64,
        lock: bool,
    ) -> Result<Option<LockedSubmission>, AssessmentError> {
        let (exercise, course_id) = assessable_exercise(tables, exercise_id)?;
        self.ensure_tutor(tables, caller, course_id)?;
        ensure_round(&exercise, round)?;

        let candidate = tables
            .submissions_for_exercise(exercise_id)
            .filter(|s| s.submitted)
            .find(|s| tables.result_for_round(s.id, round).is_none())
            .cloned();
        let Some(submission) = candidate else {
            debug!("No unassessed submission left in exercise {exercise_id} round {round}");
            return Ok(None);
        };

        if !lock {
            return Ok(Some(LockedSubmission {
                submission,
                result: None,
            }));
        }

        self.ensure_quota(tables, caller)?;
        let feedbacks = self.initial_feedback(tables, &submission, round).await;
        let result = tables.create_result(submission.id, round, Some(caller), feedbacks)?;
        info!(
            "Assessor {caller} locked submission {} for round {round}",
            submission.id
        );

        Ok(Some(LockedSubmission {
            submission,
            result: Some(result),
        }))
    }

    /// Locks one specific submission for `round`.
    ///
    /// An open result of the caller is returned unchanged. A completed result is reopened
    /// for the caller when the override policy allows it.
    pub async fn lock_submission(
        &self,
        tables: &mut Tables,
        submission_id: i64,
        round: i32,
        caller: i64,
        now: DateTime<Utc>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let submission = find_submission(tables, submission_id)?;
        let (exercise, course_id) = assessable_exercise(tables, submission.exercise_id)?;
        self.ensure_tutor(tables, caller, course_id)?;
        ensure_round(&exercise, round)?;

        let Some(existing) = tables.result_for_round(submission_id, round).cloned() else {
            self.ensure_quota(tables, caller)?;
            let feedbacks = self.initial_feedback(tables, &submission, round).await;
            let result = tables.create_result(submission_id, round, Some(caller), feedbacks)?;
            info!("Assessor {caller} locked submission {submission_id} for round {round}");
            return Ok(result);
        };

        self.check_override(tables, &exercise, course_id, &existing, caller, now)?;
        if existing.is_open() {
            return Ok(existing);
        }

        self.ensure_quota(tables, caller)?;
        let result = tables
            .result_mut(existing.id)
            .ok_or_else(|| AssessmentError::NotFound(format!("Result {}", existing.id)))?;
        result.assessor_id = Some(caller);
        result.completion_date = None;
        result.rated = None;
        result.score = None;
        info!(
            "Assessor {caller} reopened result {} of submission {submission_id} (previous assessor {:?})",
            existing.id, existing.assessor_id
        );
        Ok(result.clone())
    }

    /// Stores the complete feedback list of a result, completing it when `submit` is set.
    pub fn submit_feedback(
        &self,
        tables: &mut Tables,
        result_id: i64,
        caller: i64,
        inputs: Vec<FeedbackInput>,
        submit: bool,
        now: DateTime<Utc>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let existing = tables
            .result(result_id)
            .cloned()
            .ok_or_else(|| AssessmentError::NotFound(format!("Result {result_id}")))?;
        let submission = find_submission(tables, existing.submission_id)?;
        let (exercise, course_id) = assessable_exercise(tables, submission.exercise_id)?;
        self.ensure_tutor(tables, caller, course_id)?;
        self.check_override(tables, &exercise, course_id, &existing, caller, now)?;

        let holds_lock = existing.is_open() && existing.is_assessed_by(caller);
        if !submit && !holds_lock {
            self.ensure_quota(tables, caller)?;
        }

        let elements = match self.engine.index().elements_of(tables, &submission) {
            Ok(elements) => elements,
            Err(err) => {
                debug!("Submission {} has no referencable elements: {err}", submission.id);
                Vec::new()
            }
        };
        let feedbacks = reconcile_feedback(
            inputs,
            &elements,
            &existing.feedbacks,
            self.max_feedback_text_length,
        )?;
        let score = calculate_score(&exercise, &feedbacks)?;

        let result = tables
            .result_mut(result_id)
            .ok_or_else(|| AssessmentError::NotFound(format!("Result {result_id}")))?;
        result.assessor_id = Some(caller);
        result.assessment_type = Some(AssessmentType::for_feedbacks(&feedbacks));
        result.feedbacks = feedbacks;
        if submit {
            result.completion_date = Some(now);
            result.rated = Some(true);
            result.score = Some(score);
        } else {
            result.completion_date = None;
            result.rated = None;
            result.score = None;
        }

        info!(
            "Assessor {caller} {} result {result_id} of submission {}",
            if submit { "submitted" } else { "saved" },
            submission.id
        );
        Ok(result.clone())
    }

    /// Releases the caller's open lock on the submission, or any open lock for instructors.
    pub fn cancel_lock(
        &self,
        tables: &mut Tables,
        submission_id: i64,
        caller: i64,
    ) -> Result<AssessmentResult, AssessmentError> {
        let submission = find_submission(tables, submission_id)?;
        let (_, course_id) = assessable_exercise(tables, submission.exercise_id)?;
        self.ensure_tutor(tables, caller, course_id)?;

        let open: Vec<(i64, Option<i64>)> = tables
            .results_for_submission(submission_id)
            .into_iter()
            .filter(|r| r.is_open())
            .map(|r| (r.id, r.assessor_id))
            .collect();
        if open.is_empty() {
            return Err(AssessmentError::NotFound(format!(
                "Open assessment of submission {submission_id}"
            )));
        }

        let own = open.iter().find(|(_, assessor)| *assessor == Some(caller));
        let target = match own {
            Some((id, _)) => *id,
            None if self
                .access
                .is_at_least_instructor_in_course(tables, caller, course_id) =>
            {
                open[0].0
            }
            None => {
                warn!("User {caller} tried to cancel a foreign lock on submission {submission_id}");
                return Err(AssessmentError::Forbidden(format!(
                    "The assessment of submission {submission_id} is locked by another assessor"
                )));
            }
        };

        let removed = tables
            .remove_result(target)
            .ok_or_else(|| AssessmentError::NotFound(format!("Result {target}")))?;
        info!("User {caller} released lock {target} on submission {submission_id}");
        Ok(removed)
    }

    pub fn result_for_correction_round(
        &self,
        tables: &Tables,
        submission_id: i64,
        round: i32,
        caller: i64,
    ) -> Result<Option<AssessmentResult>, AssessmentError> {
        let submission = find_submission(tables, submission_id)?;
        let (exercise, course_id) = assessable_exercise(tables, submission.exercise_id)?;
        self.ensure_tutor(tables, caller, course_id)?;
        ensure_round(&exercise, round)?;
        Ok(tables.result_for_round(submission_id, round).cloned())
    }

    pub fn correction_round_progress(
        &self,
        tables: &Tables,
        exercise_id: i64,
        round: i32,
        caller: i64,
    ) -> Result<RoundProgress, AssessmentError> {
        let (exercise, course_id) = assessable_exercise(tables, exercise_id)?;
        self.ensure_tutor(tables, caller, course_id)?;
        ensure_round(&exercise, round)?;

        let mut progress = RoundProgress::default();
        for submission in tables
            .submissions_for_exercise(exercise_id)
            .filter(|s| s.submitted)
        {
            progress.submitted += 1;
            match tables.result_for_round(submission.id, round) {
                Some(r) if r.is_completed() => progress.assessed += 1,
                Some(_) => progress.locked += 1,
                None => {}
            }
        }
        Ok(progress)
    }

    /// Open locks held by `assessor` across every exercise.
    pub fn open_lock_count(&self, tables: &Tables, assessor: i64) -> usize {
        tables.open_results_by(assessor).count()
    }

    fn ensure_tutor(
        &self,
        tables: &Tables,
        caller: i64,
        course_id: i64,
    ) -> Result<(), AssessmentError> {
        if self
            .access
            .is_at_least_tutor_in_course(tables, caller, course_id)
        {
            Ok(())
        } else {
            Err(AssessmentError::Forbidden(format!(
                "User {caller} is not a tutor in course {course_id}"
            )))
        }
    }

    fn ensure_quota(&self, tables: &Tables, caller: i64) -> Result<(), AssessmentError> {
        let open = self.open_lock_count(tables, caller);
        if open >= self.max_locks_per_assessor {
            warn!(
                "Assessor {caller} refused a new lock: {open} of {} in use",
                self.max_locks_per_assessor
            );
            return Err(AssessmentError::QuotaExceeded {
                assessor_id: caller,
                open,
                max: self.max_locks_per_assessor,
            });
        }
        Ok(())
    }

    /// Whether `caller` may take over or rewrite `result`.
    ///
    /// Open results belong to their assessor alone. Completed results may be changed by
    /// their assessor until the assessment due date, by instructors at any time, and by
    /// other assessors once the due date passed.
    fn check_override(
        &self,
        tables: &Tables,
        exercise: &Exercise,
        course_id: i64,
        result: &AssessmentResult,
        caller: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AssessmentError> {
        let due_date_over = exercise.is_assessment_due_date_over(now);
        if result.is_assessed_by(caller) && (result.is_open() || !due_date_over) {
            return Ok(());
        }
        let is_instructor = self
            .access
            .is_at_least_instructor_in_course(tables, caller, course_id);
        if result.is_assessed_by(caller) {
            if is_instructor {
                return Ok(());
            }
            return Err(AssessmentError::Forbidden(format!(
                "The assessment due date of exercise {} has passed",
                exercise.id
            )));
        }
        if result.is_open() {
            return Err(AssessmentError::Conflict(format!(
                "Submission {} round {} is locked by another assessor",
                result.submission_id, result.correction_round
            )));
        }
        if is_instructor || due_date_over {
            return Ok(());
        }
        Err(AssessmentError::Conflict(format!(
            "Submission {} round {} was already assessed by another assessor",
            result.submission_id, result.correction_round
        )))
    }

    /// Feedback a fresh lock starts with: the completed previous round if there is one,
    /// otherwise the current suggestion.
    async fn initial_feedback(
        &self,
        tables: &Tables,
        submission: &Submission,
        round: i32,
    ) -> Vec<Feedback> {
        if round > 0 {
            if let Some(previous) = tables
                .result_for_round(submission.id, round - 1)
                .filter(|r| r.is_completed())
            {
                return previous.feedbacks.clone();
            }
        }

        match self.engine.suggest(tables, submission.id).await {
            Ok(Some(suggestion)) => suggestion.feedbacks,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("No suggestion for submission {}: {err}", submission.id);
                Vec::new()
            }
        }
    }
}

fn find_submission(tables: &Tables, submission_id: i64) -> Result<Submission, AssessmentError> {
    tables
        .submission(submission_id)
        .cloned()
        .ok_or_else(|| AssessmentError::NotFound(format!("Submission {submission_id}")))
}

/// The exercise with its course; assessment without a course has no point configuration.
fn assessable_exercise(
    tables: &Tables,
    exercise_id: i64,
) -> Result<(Exercise, i64), AssessmentError> {
    let exercise = tables
        .exercise(exercise_id)
        .cloned()
        .ok_or_else(|| AssessmentError::NotFound(format!("Exercise {exercise_id}")))?;
    let course_id = exercise.course_id.ok_or_else(|| {
        AssessmentError::InvalidExercise(format!("Exercise {exercise_id} is not linked to a course"))
    })?;
    Ok((exercise, course_id))
}

fn ensure_round(exercise: &Exercise, round: i32) -> Result<(), AssessmentError> {
    if exercise.has_correction_round(round) {
        Ok(())
    } else {
        Err(AssessmentError::BadRequest(format!(
            "Exercise {} has no correction round {round}",
            exercise.id
        )))
    }
}
