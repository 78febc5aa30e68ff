//! The similarity clustering engine.
//!
//! One [`ExerciseIndex`] per built exercise, kept in a process-wide map. Clustering is
//! greedy and order dependent, so builds always process submissions by ascending id to
//! stay reproducible.

use crate::error::SimilarityError;
use crate::extraction::{kind_name, Extract};
use crate::matcher::{ElementMatcher, NameSimilarityMatcher};
use crate::set::{SetMember, SimilaritySet};
use db::models::{Element, Submission};
use db::Tables;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Counts reported after a full build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub submissions: usize,
    pub elements: usize,
    pub sets: usize,
    /// Submissions whose content could not be parsed and were left out.
    pub skipped: usize,
}

/// Similarity sets of a single exercise.
#[derive(Debug)]
pub struct ExerciseIndex {
    exercise_id: i64,
    sets: BTreeMap<i64, SimilaritySet>,
    membership: HashMap<(i64, String), i64>,
    elements: BTreeMap<i64, Vec<Element>>,
    next_set_id: i64,
}

impl ExerciseIndex {
    fn new(exercise_id: i64) -> Self {
        Self {
            exercise_id,
            sets: BTreeMap::new(),
            membership: HashMap::new(),
            elements: BTreeMap::new(),
            next_set_id: 0,
        }
    }

    pub fn exercise_id(&self) -> i64 {
        self.exercise_id
    }

    pub fn sets(&self) -> impl Iterator<Item = &SimilaritySet> {
        self.sets.values()
    }

    pub fn is_indexed(&self, submission_id: i64) -> bool {
        self.elements.contains_key(&submission_id)
    }

    /// The set holding `reference` of `submission_id`.
    pub fn set_of(&self, submission_id: i64, reference: &str) -> Option<&SimilaritySet> {
        self.membership
            .get(&(submission_id, reference.to_string()))
            .and_then(|id| self.sets.get(id))
    }

    /// The most similar set that `element` would join, without joining it.
    ///
    /// Sets already holding an element of `submission_id`, and the `claimed` ones, are
    /// skipped. Ties go to the lower set id because sets are visited in id order and only
    /// strictly better candidates replace the current best.
    fn best_set(
        &self,
        submission_id: i64,
        element: &Element,
        matcher: &dyn ElementMatcher,
        claimed: &HashSet<i64>,
    ) -> Option<i64> {
        let mut best: Option<(i64, f64)> = None;
        for (id, set) in &self.sets {
            if claimed.contains(id) || set.contains_submission(submission_id) {
                continue;
            }
            let similarity = matcher.similarity(set.prototype(), element);
            if similarity < matcher.threshold() {
                continue;
            }
            if best.is_none_or(|(_, current)| similarity > current) {
                best = Some((*id, similarity));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Merges the elements of one submission, returning the ids of every set touched.
    fn insert_submission(
        &mut self,
        submission_id: i64,
        elements: Vec<Element>,
        matcher: &dyn ElementMatcher,
    ) -> Vec<i64> {
        let mut touched = Vec::with_capacity(elements.len());
        let none_claimed = HashSet::new();

        for element in &elements {
            let member = SetMember {
                submission_id,
                element: element.clone(),
            };
            let set_id = match self.best_set(submission_id, element, matcher, &none_claimed) {
                Some(id) => {
                    if let Some(set) = self.sets.get_mut(&id) {
                        set.push(member);
                    }
                    id
                }
                None => {
                    self.next_set_id += 1;
                    let id = self.next_set_id;
                    self.sets
                        .insert(id, SimilaritySet::new(id, self.exercise_id, member));
                    id
                }
            };
            self.membership
                .insert((submission_id, element.reference.clone()), set_id);
            touched.push(set_id);
        }

        self.elements.insert(submission_id, elements);
        touched.sort_unstable();
        touched.dedup();
        touched
    }
}

type IndexHandle = Arc<RwLock<ExerciseIndex>>;

/// Process-wide registry of built exercises and their similarity sets.
///
/// Lock order: callers hold the store guard (if any) first, then this registry, then a
/// single exercise index, then set representatives. Nothing here ever reaches back
/// into the store.
pub struct SimilarityIndex {
    exercises: RwLock<HashMap<i64, IndexHandle>>,
    matcher: Arc<dyn ElementMatcher>,
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new(Arc::new(NameSimilarityMatcher::default()))
    }
}

impl SimilarityIndex {
    pub fn new(matcher: Arc<dyn ElementMatcher>) -> Self {
        Self {
            exercises: RwLock::new(HashMap::new()),
            matcher,
        }
    }

    async fn handle(&self, exercise_id: i64) -> Option<IndexHandle> {
        self.exercises.read().await.get(&exercise_id).cloned()
    }

    pub async fn is_built(&self, exercise_id: i64) -> bool {
        self.exercises.read().await.contains_key(&exercise_id)
    }

    /// Extracts the elements of one stored submission.
    pub fn elements_of(
        &self,
        tables: &Tables,
        submission: &Submission,
    ) -> Result<Vec<Element>, SimilarityError> {
        let exercise = tables
            .exercise(submission.exercise_id)
            .ok_or(SimilarityError::UnknownExercise(submission.exercise_id))?;
        exercise.kind.extract(submission)
    }

    /// Rebuilds every similarity set of the exercise from scratch and swaps the result
    /// in atomically.
    ///
    /// Submissions with malformed content are skipped with a warning so one broken
    /// payload cannot block suggestions for the rest of the exercise.
    pub async fn build(
        &self,
        tables: &Tables,
        exercise_id: i64,
    ) -> Result<BuildSummary, SimilarityError> {
        let exercise = tables
            .exercise(exercise_id)
            .ok_or(SimilarityError::UnknownExercise(exercise_id))?;
        if !exercise.kind.supports_elements() {
            return Err(SimilarityError::UnsupportedExercise {
                exercise_id,
                kind: kind_name(&exercise.kind).to_string(),
            });
        }

        let mut index = ExerciseIndex::new(exercise_id);
        let mut summary = BuildSummary::default();

        for submission in tables.submissions_for_exercise(exercise_id) {
            let elements = match exercise.kind.extract(submission) {
                Ok(elements) => elements,
                Err(err) => {
                    warn!(submission_id = submission.id, error = %err, "Skipping submission during build");
                    summary.skipped += 1;
                    continue;
                }
            };
            summary.submissions += 1;
            summary.elements += elements.len();
            index.insert_submission(submission.id, elements, self.matcher.as_ref());
        }
        summary.sets = index.sets.len();

        self.exercises
            .write()
            .await
            .insert(exercise_id, Arc::new(RwLock::new(index)));

        info!(
            exercise_id,
            submissions = summary.submissions,
            elements = summary.elements,
            sets = summary.sets,
            "Built similarity index"
        );
        Ok(summary)
    }

    /// Merges a newly stored submission into an already built exercise.
    ///
    /// Returns the sets the submission's elements now belong to. Nothing happens for
    /// exercises that were never built or submissions that are already indexed.
    pub async fn add_submission(
        &self,
        tables: &Tables,
        submission_id: i64,
    ) -> Result<Vec<SimilaritySet>, SimilarityError> {
        let submission = tables
            .submission(submission_id)
            .ok_or(SimilarityError::UnknownSubmission(submission_id))?;
        let Some(handle) = self.handle(submission.exercise_id).await else {
            debug!(submission_id, "Exercise not built, skipping incremental merge");
            return Ok(Vec::new());
        };

        let elements = self.elements_of(tables, submission)?;

        let mut index = handle.write().await;
        if index.is_indexed(submission_id) {
            return Ok(Vec::new());
        }
        let touched = index.insert_submission(submission_id, elements, self.matcher.as_ref());

        debug!(
            submission_id,
            exercise_id = submission.exercise_id,
            sets = touched.len(),
            "Merged submission into similarity sets"
        );
        Ok(touched
            .iter()
            .filter_map(|id| index.sets.get(id).cloned())
            .collect())
    }

    /// Drops all similarity sets of the exercise. Returns whether it had been built.
    pub async fn remove_exercise(&self, exercise_id: i64) -> bool {
        let removed = self.exercises.write().await.remove(&exercise_id).is_some();
        if removed {
            info!(exercise_id, "Removed similarity index");
        }
        removed
    }

    /// Snapshot of every set of the exercise, empty if it was never built.
    pub async fn sets(&self, exercise_id: i64) -> Vec<SimilaritySet> {
        match self.handle(exercise_id).await {
            Some(handle) => handle.read().await.sets().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Sets holding at least one element of the submission.
    pub async fn sets_of_submission(
        &self,
        exercise_id: i64,
        submission_id: i64,
    ) -> Vec<SimilaritySet> {
        let Some(handle) = self.handle(exercise_id).await else {
            return Vec::new();
        };
        let index = handle.read().await;
        index
            .sets()
            .filter(|set| set.contains_submission(submission_id))
            .cloned()
            .collect()
    }

    /// Pairs each element with the set it belongs to, or would join.
    ///
    /// Indexed submissions resolve through their recorded membership; anything else is
    /// classified against the current sets without modifying them, one set per submission
    /// at most, as a real insert would. Returns `None` if the exercise was never built.
    pub async fn resolve(
        &self,
        exercise_id: i64,
        submission_id: i64,
        elements: &[Element],
    ) -> Option<Vec<(Element, Option<SimilaritySet>)>> {
        let handle = self.handle(exercise_id).await?;
        let index = handle.read().await;

        let mut claimed = HashSet::with_capacity(elements.len());
        let mut resolved = Vec::with_capacity(elements.len());
        for element in elements {
            let set = match index.set_of(submission_id, &element.reference) {
                Some(set) => Some(set),
                None => index
                    .best_set(submission_id, element, self.matcher.as_ref(), &claimed)
                    .and_then(|id| index.sets.get(&id)),
            };
            if let Some(set) = set {
                claimed.insert(set.id());
            }
            resolved.push((element.clone(), set.cloned()));
        }
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::models::exercise::ExerciseKind;
    use db::test_utils::{model_json, one_class_model, seed_exercise, seed_submission};

    #[tokio::test]
    async fn test_build_groups_equivalent_elements() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        seed_submission(&mut tables, 1, Some(&one_class_model()));
        seed_submission(&mut tables, 1, Some(&one_class_model()));
        seed_submission(
            &mut tables,
            1,
            Some(&model_json(&[("x", "Class", "Engine", None)], &[])),
        );

        let index = SimilarityIndex::default();
        let summary = index.build(&tables, 1).await.unwrap();
        assert_eq!(summary.submissions, 3);
        assert_eq!(summary.sets, 2);

        let sets = index.sets(1).await;
        assert_eq!(sets[0].len(), 2);
        assert_eq!(sets[1].len(), 1);
        assert_eq!(sets[1].prototype().name, "Engine");
    }

    #[tokio::test]
    async fn test_elements_of_one_submission_never_share_a_set() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        let twins = model_json(
            &[("a", "Class", "Car", None), ("b", "Class", "Car", None)],
            &[],
        );
        seed_submission(&mut tables, 1, Some(&twins));
        seed_submission(&mut tables, 1, Some(&twins));

        let index = SimilarityIndex::default();
        index.build(&tables, 1).await.unwrap();

        for set in index.sets(1).await {
            let mut ids: Vec<_> = set.members().iter().map(|m| m.submission_id).collect();
            ids.dedup();
            assert_eq!(ids.len(), set.len());
        }
        assert_eq!(index.sets(1).await.len(), 2);
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        for name in ["Car", "car", "Bus", "Car Park"] {
            seed_submission(
                &mut tables,
                1,
                Some(&model_json(&[("c", "Class", name, None)], &[])),
            );
        }

        let index = SimilarityIndex::default();
        index.build(&tables, 1).await.unwrap();
        let first: Vec<_> = index.sets(1).await.iter().map(|s| s.members().to_vec()).collect();
        index.build(&tables, 1).await.unwrap();
        let second: Vec<_> = index.sets(1).await.iter().map(|s| s.members().to_vec()).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unsupported_exercise_kind() {
        let mut tables = Tables::default();
        let mut exercise = seed_exercise(&mut tables, 1, 1);
        exercise.kind = ExerciseKind::FileUpload;
        tables.upsert_exercise(exercise);

        let err = SimilarityIndex::default().build(&tables, 1).await.unwrap_err();
        assert!(matches!(err, SimilarityError::UnsupportedExercise { exercise_id: 1, .. }));
    }

    #[tokio::test]
    async fn test_malformed_submissions_are_skipped() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        seed_submission(&mut tables, 1, Some("{broken"));
        seed_submission(&mut tables, 1, Some(&one_class_model()));

        let summary = SimilarityIndex::default().build(&tables, 1).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.submissions, 1);
    }

    #[tokio::test]
    async fn test_add_submission_merges_incrementally() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        seed_submission(&mut tables, 1, Some(&one_class_model()));

        let index = SimilarityIndex::default();
        let late = seed_submission(&mut tables, 1, Some(&one_class_model()));
        assert!(index.add_submission(&tables, late.id).await.unwrap().is_empty());

        index.build(&tables, 1).await.unwrap();
        let newer = seed_submission(&mut tables, 1, Some(&one_class_model()));
        let touched = index.add_submission(&tables, newer.id).await.unwrap();
        assert_eq!(touched.len(), 1);
        assert_eq!(touched[0].len(), 3);

        assert!(index.add_submission(&tables, newer.id).await.unwrap().is_empty());
        assert_eq!(index.sets(1).await[0].len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_classifies_unindexed_submissions() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        let first = seed_submission(&mut tables, 1, Some(&one_class_model()));

        let index = SimilarityIndex::default();
        assert!(index.resolve(1, first.id, &[]).await.is_none());
        index.build(&tables, 1).await.unwrap();

        let stranger = Element::new("Class:zz", "Class", "Car", "");
        let unknown = Element::new("Class:yy", "Class", "Airplane", "");
        let resolved = index.resolve(1, 99, &[stranger, unknown]).await.unwrap();
        assert!(resolved[0].1.is_some());
        assert!(resolved[1].1.is_none());
        assert_eq!(index.sets(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_claims_each_set_once() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        seed_submission(&mut tables, 1, Some(&one_class_model()));
        let index = SimilarityIndex::default();
        index.build(&tables, 1).await.unwrap();

        let upper = Element::new("Class:t1", "Class", "Car", "");
        let lower = Element::new("Class:t2", "Class", "car", "");
        let resolved = index.resolve(1, 99, &[upper, lower]).await.unwrap();
        assert!(resolved[0].1.is_some());
        assert!(resolved[1].1.is_none());
    }

    #[tokio::test]
    async fn test_remove_exercise() {
        let mut tables = Tables::default();
        seed_exercise(&mut tables, 1, 1);
        let index = SimilarityIndex::default();
        index.build(&tables, 1).await.unwrap();
        assert!(index.is_built(1).await);
        assert!(index.remove_exercise(1).await);
        assert!(!index.is_built(1).await);
        assert!(!index.remove_exercise(1).await);
    }
}
