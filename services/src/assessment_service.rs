//! Entry point for collaborators of the assessment engine.
//!
//! `AssessmentService` owns the store handle, the suggestion engine and the lock
//! coordinator, and decides which store guard each operation runs under:
//!
//! - reads (suggestions, result lookups, progress) run under the read guard;
//! - lock acquisition, feedback submission and cancellation run under the write guard,
//!   so quota checks and result creation cannot interleave;
//! - representative recomputation after a write runs once the write guard is released.

use crate::access_policy::{AccessPolicy, CourseRoleAccess};
use crate::lock_coordinator::{LockCoordinator, LockedSubmission, RoundProgress};
use chrono::Utc;
use common::AssessmentConfig;
use db::models::AssessmentResult;
use db::{Store, Tables};
use log::info;
use marker::feedback::FeedbackInput;
use marker::{AssessmentError, Suggestion, SuggestionEngine};
use similarity::BuildSummary;
use std::sync::Arc;

pub struct AssessmentService {
    store: Store,
    engine: Arc<SuggestionEngine>,
    access: Arc<dyn AccessPolicy>,
    coordinator: LockCoordinator,
}

impl AssessmentService {
    pub fn new(store: Store, config: &AssessmentConfig) -> Self {
        Self::with_access_policy(store, config, Arc::new(CourseRoleAccess))
    }

    /// Uses the process-wide configuration loaded from `.env` and the environment.
    pub fn with_global_config(store: Store) -> Self {
        Self::new(store, AssessmentConfig::global())
    }

    pub fn with_access_policy(
        store: Store,
        config: &AssessmentConfig,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        let engine = Arc::new(SuggestionEngine::from_config(config));
        let coordinator = LockCoordinator::new(
            engine.clone(),
            access.clone(),
            config.max_locks_per_assessor,
            config.max_feedback_text_length,
        );
        Self {
            store,
            engine,
            access,
            coordinator,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    /// Opts the exercise into automatic assessment by clustering all its submissions.
    ///
    /// Instructors only. Calling it again rebuilds everything from scratch.
    pub async fn build_suggestion_index(
        &self,
        exercise_id: i64,
        caller: i64,
    ) -> Result<BuildSummary, AssessmentError> {
        let tables = self.store.read().await;
        let exercise = tables
            .exercise(exercise_id)
            .ok_or_else(|| AssessmentError::NotFound(format!("Exercise {exercise_id}")))?;
        let course_id = exercise.course_id.ok_or_else(|| {
            AssessmentError::InvalidExercise(format!(
                "Exercise {exercise_id} is not linked to a course"
            ))
        })?;
        if !self
            .access
            .is_at_least_instructor_in_course(&tables, caller, course_id)
        {
            return Err(AssessmentError::Forbidden(format!(
                "User {caller} is not an instructor in course {course_id}"
            )));
        }

        let summary = self.engine.build(&tables, exercise_id).await?;
        info!(
            "User {caller} built the suggestion index of exercise {exercise_id}: {} sets from {} submissions",
            summary.sets, summary.submissions
        );
        Ok(summary)
    }

    pub async fn get_suggestion(
        &self,
        submission_id: i64,
        caller: i64,
    ) -> Result<Option<Suggestion>, AssessmentError> {
        let tables = self.store.read().await;
        self.ensure_tutor_for_submission(&tables, submission_id, caller)?;
        self.engine.suggest(&tables, submission_id).await
    }

    pub async fn lock_next_unassessed(
        &self,
        exercise_id: i64,
        round: i32,
        caller: i64,
        lock: bool,
    ) -> Result<Option<LockedSubmission>, AssessmentError> {
        let mut tables = self.store.write().await;
        self.coordinator
            .lock_next_unassessed(&mut tables, exercise_id, round, caller, lock)
            .await
    }

    pub async fn lock_submission(
        &self,
        submission_id: i64,
        round: i32,
        caller: i64,
    ) -> Result<AssessmentResult, AssessmentError> {
        let result = {
            let mut tables = self.store.write().await;
            self.coordinator
                .lock_submission(&mut tables, submission_id, round, caller, Utc::now())
                .await?
        };
        self.refresh_after_change(result.submission_id).await;
        Ok(result)
    }

    /// Saves (`submit == false`) or submits the complete feedback of a result, then
    /// recomputes the similarity sets the submission takes part in.
    pub async fn submit_feedback(
        &self,
        result_id: i64,
        caller: i64,
        feedbacks: Vec<FeedbackInput>,
        submit: bool,
    ) -> Result<AssessmentResult, AssessmentError> {
        let result = {
            let mut tables = self.store.write().await;
            self.coordinator.submit_feedback(
                &mut tables,
                result_id,
                caller,
                feedbacks,
                submit,
                Utc::now(),
            )?
        };
        self.refresh_after_change(result.submission_id).await;
        Ok(result)
    }

    pub async fn cancel_lock(&self, submission_id: i64, caller: i64) -> Result<(), AssessmentError> {
        let mut tables = self.store.write().await;
        self.coordinator
            .cancel_lock(&mut tables, submission_id, caller)
            .map(|_| ())
    }

    pub async fn get_result_for_correction_round(
        &self,
        submission_id: i64,
        round: i32,
        caller: i64,
    ) -> Result<Option<AssessmentResult>, AssessmentError> {
        let tables = self.store.read().await;
        self.coordinator
            .result_for_correction_round(&tables, submission_id, round, caller)
    }

    pub async fn correction_round_progress(
        &self,
        exercise_id: i64,
        round: i32,
        caller: i64,
    ) -> Result<RoundProgress, AssessmentError> {
        let tables = self.store.read().await;
        self.coordinator
            .correction_round_progress(&tables, exercise_id, round, caller)
    }

    pub async fn open_lock_count(&self, assessor: i64) -> usize {
        let tables = self.store.read().await;
        self.coordinator.open_lock_count(&tables, assessor)
    }

    /// Merges a newly stored submission into the sets of its exercise, if built.
    pub async fn on_new_submission(&self, submission_id: i64) -> Result<usize, AssessmentError> {
        let tables = self.store.read().await;
        self.engine.on_new_submission(&tables, submission_id).await
    }

    /// Deletes the exercise with everything attached and drops its similarity sets.
    pub async fn remove_exercise(&self, exercise_id: i64) -> bool {
        let mut tables = self.store.write().await;
        let existed = tables.remove_exercise(exercise_id).is_some();
        let was_built = self.engine.index().remove_exercise(exercise_id).await;
        if existed {
            info!("Removed exercise {exercise_id} (similarity index dropped: {was_built})");
        }
        existed
    }

    async fn refresh_after_change(&self, submission_id: i64) {
        let tables = self.store.read().await;
        if let Some(submission) = tables.submission(submission_id) {
            self.engine
                .refresh_submission(&tables, submission.exercise_id, submission_id)
                .await;
        }
    }

    fn ensure_tutor_for_submission(
        &self,
        tables: &Tables,
        submission_id: i64,
        caller: i64,
    ) -> Result<(), AssessmentError> {
        let submission = tables
            .submission(submission_id)
            .ok_or_else(|| AssessmentError::NotFound(format!("Submission {submission_id}")))?;
        let course_id = tables
            .exercise(submission.exercise_id)
            .and_then(|e| e.course_id)
            .ok_or_else(|| {
                AssessmentError::InvalidExercise(format!(
                    "Exercise {} is not linked to a course",
                    submission.exercise_id
                ))
            })?;
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
}
