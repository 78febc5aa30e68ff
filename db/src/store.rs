//! Arena-style storage for everything the assessment engine reads and writes.
//!
//! All entities are keyed by opaque `i64` ids and reference each other only by id
//! (results hold a submission id, submissions hold a participation id). The whole
//! arena sits behind one async `RwLock`; callers that need a read-then-write to be
//! atomic (lock acquisition plus quota check) hold the write guard for the full unit.

use crate::models::{
    course_role::Role, exercise, feedback, participation, result, submission, CourseRole,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Submission {0} does not exist")]
    UnknownSubmission(i64),

    #[error("Exercise {0} does not exist")]
    UnknownExercise(i64),

    #[error("Submission {submission_id} already has a result for correction round {correction_round}")]
    DuplicateResult {
        submission_id: i64,
        correction_round: i32,
    },
}

/// Shared handle to the arena.
#[derive(Clone, Default)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}

#[derive(Debug, Default)]
pub struct Tables {
    exercises: BTreeMap<i64, exercise::Model>,
    participations: BTreeMap<i64, participation::Model>,
    submissions: BTreeMap<i64, submission::Model>,
    results: BTreeMap<i64, result::Model>,
    roles: BTreeMap<(i64, i64), CourseRole>,
    next_participation_id: i64,
    next_submission_id: i64,
    next_result_id: i64,
}

impl Tables {
    // --- exercises -------------------------------------------------------

    pub fn upsert_exercise(&mut self, exercise: exercise::Model) {
        self.exercises.insert(exercise.id, exercise);
    }

    pub fn exercise(&self, id: i64) -> Option<&exercise::Model> {
        self.exercises.get(&id)
    }

    /// Removes the exercise with all its participations, submissions and results.
    pub fn remove_exercise(&mut self, id: i64) -> Option<exercise::Model> {
        let removed = self.exercises.remove(&id)?;

        let submission_ids: Vec<i64> = self
            .submissions
            .values()
            .filter(|s| s.exercise_id == id)
            .map(|s| s.id)
            .collect();
        self.results
            .retain(|_, r| !submission_ids.contains(&r.submission_id));
        self.submissions.retain(|_, s| s.exercise_id != id);
        self.participations.retain(|_, p| p.exercise_id != id);

        Some(removed)
    }

    // --- participations & submissions -------------------------------------

    pub fn create_participation(
        &mut self,
        exercise_id: i64,
        owner: participation::Owner,
    ) -> participation::Model {
        self.next_participation_id += 1;
        let model = participation::Model {
            id: self.next_participation_id,
            exercise_id,
            owner,
        };
        self.participations.insert(model.id, model.clone());
        model
    }

    pub fn participation(&self, id: i64) -> Option<&participation::Model> {
        self.participations.get(&id)
    }

    /// Stores a new submission and returns it with its assigned id.
    pub fn create_submission(
        &mut self,
        exercise_id: i64,
        participation_id: i64,
        content: Option<String>,
        submitted: bool,
        submission_date: Option<DateTime<Utc>>,
    ) -> Result<submission::Model, StoreError> {
        if !self.exercises.contains_key(&exercise_id) {
            return Err(StoreError::UnknownExercise(exercise_id));
        }

        self.next_submission_id += 1;
        let model = submission::Model {
            id: self.next_submission_id,
            exercise_id,
            participation_id,
            submitted,
            submission_date,
            content,
        };
        self.submissions.insert(model.id, model.clone());
        Ok(model)
    }

    pub fn submission(&self, id: i64) -> Option<&submission::Model> {
        self.submissions.get(&id)
    }

    pub fn submission_mut(&mut self, id: i64) -> Option<&mut submission::Model> {
        self.submissions.get_mut(&id)
    }

    /// Submissions of one exercise in insertion (id) order.
    pub fn submissions_for_exercise(
        &self,
        exercise_id: i64,
    ) -> impl Iterator<Item = &submission::Model> {
        self.submissions
            .values()
            .filter(move |s| s.exercise_id == exercise_id)
    }

    // --- roles -------------------------------------------------------------

    pub fn assign_role(&mut self, user_id: i64, course_id: i64, role: Role) {
        self.roles.insert(
            (user_id, course_id),
            CourseRole {
                user_id,
                course_id,
                role,
            },
        );
    }

    pub fn role(&self, user_id: i64, course_id: i64) -> Option<Role> {
        self.roles.get(&(user_id, course_id)).map(|r| r.role)
    }

    // --- results -----------------------------------------------------------

    /// Creates the result for `(submission_id, correction_round)`.
    ///
    /// Fails if that round already has a result, so at most one result (and therefore at
    /// most one open lock) exists per round.
    pub fn create_result(
        &mut self,
        submission_id: i64,
        correction_round: i32,
        assessor_id: Option<i64>,
        feedbacks: Vec<feedback::Model>,
    ) -> Result<result::Model, StoreError> {
        if !self.submissions.contains_key(&submission_id) {
            return Err(StoreError::UnknownSubmission(submission_id));
        }
        if self.result_for_round(submission_id, correction_round).is_some() {
            return Err(StoreError::DuplicateResult {
                submission_id,
                correction_round,
            });
        }

        self.next_result_id += 1;
        let model = result::Model {
            id: self.next_result_id,
            submission_id,
            correction_round,
            assessor_id,
            score: None,
            rated: None,
            completion_date: None,
            assessment_type: None,
            feedbacks,
        };
        self.results.insert(model.id, model.clone());
        Ok(model)
    }

    pub fn result(&self, id: i64) -> Option<&result::Model> {
        self.results.get(&id)
    }

    pub fn result_mut(&mut self, id: i64) -> Option<&mut result::Model> {
        self.results.get_mut(&id)
    }

    pub fn remove_result(&mut self, id: i64) -> Option<result::Model> {
        self.results.remove(&id)
    }

    /// All results of a submission ordered by correction round.
    pub fn results_for_submission(&self, submission_id: i64) -> Vec<&result::Model> {
        let mut results: Vec<_> = self
            .results
            .values()
            .filter(|r| r.submission_id == submission_id)
            .collect();
        results.sort_by_key(|r| r.correction_round);
        results
    }

    pub fn result_for_round(
        &self,
        submission_id: i64,
        correction_round: i32,
    ) -> Option<&result::Model> {
        self.results
            .values()
            .find(|r| r.submission_id == submission_id && r.correction_round == correction_round)
    }

    /// The completed result of the highest correction round, i.e. the one that counts.
    pub fn latest_completed_result(&self, submission_id: i64) -> Option<&result::Model> {
        self.results
            .values()
            .filter(|r| r.submission_id == submission_id && r.is_completed())
            .max_by_key(|r| r.correction_round)
    }

    /// Open results (locks) held by `assessor_id` across every exercise.
    pub fn open_results_by(&self, assessor_id: i64) -> impl Iterator<Item = &result::Model> {
        self.results
            .values()
            .filter(move |r| r.is_open() && r.is_assessed_by(assessor_id))
    }
}
