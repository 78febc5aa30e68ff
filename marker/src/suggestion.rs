//! # Suggestion Engine
//!
//! Produces automatic feedback for a submission from the cached representatives of the
//! similarity sets its elements belong to, and keeps those representatives current.
//!
//! ## Overview
//!
//! - [`SuggestionEngine::build`] clusters an exercise from scratch and computes every
//!   representative. Until an exercise has been built, no suggestions exist for it.
//! - [`SuggestionEngine::refresh_submission`] recomputes the representatives of every set
//!   a submission takes part in. It runs after assessor feedback on that submission
//!   changes.
//! - [`SuggestionEngine::suggest`] reads the cached representatives and never recomputes.
//!
//! Representatives are learned only from `MANUAL` and `AUTOMATIC_ADAPTED` feedback on
//! completed results, so unconfirmed automatic feedback never reinforces itself.

use crate::confidence::MajorityAgreement;
use crate::error::AssessmentError;
use crate::scorer::calculate_score;
use crate::traits::confidence::{ConfidencePolicy, FeedbackSample};
use crate::types::Suggestion;
use common::AssessmentConfig;
use db::models::{feedback::FeedbackType, result::AssessmentType, Feedback};
use db::Tables;
use similarity::{BuildSummary, NameSimilarityMatcher, SetMember, SimilarityIndex, SimilaritySet};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SuggestionEngine {
    index: Arc<SimilarityIndex>,
    policy: Arc<dyn ConfidencePolicy>,
}

impl SuggestionEngine {
    pub fn new(index: Arc<SimilarityIndex>, policy: Arc<dyn ConfidencePolicy>) -> Self {
        Self { index, policy }
    }

    /// Name matching and majority agreement, tuned by `config`.
    pub fn from_config(config: &AssessmentConfig) -> Self {
        let matcher = NameSimilarityMatcher::new(config.similarity_threshold);
        Self::new(
            Arc::new(SimilarityIndex::new(Arc::new(matcher))),
            Arc::new(MajorityAgreement::from(config)),
        )
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub async fn is_built(&self, exercise_id: i64) -> bool {
        self.index.is_built(exercise_id).await
    }

    /// Rebuilds the similarity sets of the exercise and all their representatives.
    pub async fn build(
        &self,
        tables: &Tables,
        exercise_id: i64,
    ) -> Result<BuildSummary, AssessmentError> {
        let summary = self.index.build(tables, exercise_id).await?;
        let sets = self.index.sets(exercise_id).await;
        let suggesting = self.refresh(tables, &sets).await;
        info!(exercise_id, sets = sets.len(), suggesting, "Computed representatives");
        Ok(summary)
    }

    /// Merges a new submission into its built exercise and refreshes the touched sets.
    ///
    /// Returns the number of sets touched; zero when the exercise was never built or the
    /// submission is already known.
    pub async fn on_new_submission(
        &self,
        tables: &Tables,
        submission_id: i64,
    ) -> Result<usize, AssessmentError> {
        let touched = self.index.add_submission(tables, submission_id).await?;
        self.refresh(tables, &touched).await;
        Ok(touched.len())
    }

    /// Recomputes every set the submission has an element in.
    pub async fn refresh_submission(
        &self,
        tables: &Tables,
        exercise_id: i64,
        submission_id: i64,
    ) -> usize {
        let sets = self.index.sets_of_submission(exercise_id, submission_id).await;
        self.refresh(tables, &sets).await;
        debug!(exercise_id, submission_id, sets = sets.len(), "Refreshed representatives");
        sets.len()
    }

    /// Recomputes the given sets, returning how many now carry a representative.
    async fn refresh(&self, tables: &Tables, sets: &[SimilaritySet]) -> usize {
        let mut suggesting = 0;
        for set in sets {
            let representative = set
                .recompute(|members| self.policy.evaluate(&collect_samples(tables, members)))
                .await;
            if representative.is_some() {
                suggesting += 1;
            }
        }
        suggesting
    }

    /// Proposes a result for the submission, or `None` when nothing can be suggested.
    ///
    /// There is no suggestion when the exercise was never built, the submission has no
    /// elements, it already has a completed or rated result, or none of its elements
    /// belongs to a set with a representative.
    pub async fn suggest(
        &self,
        tables: &Tables,
        submission_id: i64,
    ) -> Result<Option<Suggestion>, AssessmentError> {
        let submission = tables
            .submission(submission_id)
            .ok_or_else(|| AssessmentError::NotFound(format!("Submission {submission_id}")))?;
        let exercise = tables.exercise(submission.exercise_id).ok_or_else(|| {
            AssessmentError::NotFound(format!("Exercise {}", submission.exercise_id))
        })?;

        if !self.index.is_built(exercise.id).await {
            return Ok(None);
        }
        if tables
            .results_for_submission(submission_id)
            .iter()
            .any(|r| r.is_completed() || r.rated.is_some())
        {
            return Ok(None);
        }

        let elements = self.index.elements_of(tables, submission)?;
        if elements.is_empty() {
            return Ok(None);
        }
        let Some(resolved) = self
            .index
            .resolve(exercise.id, submission_id, &elements)
            .await
        else {
            return Ok(None);
        };

        let mut feedbacks = Vec::new();
        for (element, set) in resolved {
            let Some(set) = set else { continue };
            let Some(representative) = set.representative().await else {
                continue;
            };
            feedbacks.push(Feedback {
                credits: Some(representative.credits),
                text: representative.text,
                feedback_type: FeedbackType::Automatic,
                reference: Some(element.reference),
                grading_instruction_id: representative.grading_instruction_id,
            });
        }

        if feedbacks.is_empty() {
            return Ok(None);
        }

        let score = calculate_score(exercise, &feedbacks)?;
        Ok(Some(Suggestion {
            submission_id,
            exercise_id: exercise.id,
            feedbacks,
            score,
            assessment_type: AssessmentType::SemiAutomatic,
            rated: None,
            assessor_id: None,
            completion_date: None,
        }))
    }
}

/// Assessor-written feedback on each member, taken from the member submission's latest
/// completed result, in member order.
pub fn collect_samples(tables: &Tables, members: &[SetMember]) -> Vec<FeedbackSample> {
    members
        .iter()
        .filter_map(|member| {
            let result = tables.latest_completed_result(member.submission_id)?;
            let feedback = result.feedback_for(&member.element.reference)?;
            feedback
                .feedback_type
                .is_assessor_authored()
                .then(|| FeedbackSample {
                    submission_id: member.submission_id,
                    credits: feedback.credits,
                    text: feedback.text.clone(),
                    grading_instruction_id: feedback.grading_instruction_id,
                })
        })
        .collect()
}
