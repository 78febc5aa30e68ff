use db::models::Element;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cached automatic feedback for every element of a similarity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representative {
    pub credits: f64,
    pub text: Option<String>,
    pub grading_instruction_id: Option<i64>,
    /// Share of sampled feedback that agreed on `credits`, in `[0, 1]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetMember {
    pub submission_id: i64,
    pub element: Element,
}

/// Elements of different submissions of one exercise judged equivalent.
///
/// Membership only changes under the owning exercise index's write lock. The
/// representative has its own lock so recomputation of different sets never contends;
/// clones share it.
#[derive(Debug, Clone)]
pub struct SimilaritySet {
    id: i64,
    exercise_id: i64,
    members: Vec<SetMember>,
    submissions: HashSet<i64>,
    representative: Arc<RwLock<Option<Representative>>>,
}

impl SimilaritySet {
    pub(crate) fn new(id: i64, exercise_id: i64, first: SetMember) -> Self {
        let mut submissions = HashSet::new();
        submissions.insert(first.submission_id);
        Self {
            id,
            exercise_id,
            members: vec![first],
            submissions,
            representative: Arc::new(RwLock::new(None)),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn exercise_id(&self) -> i64 {
        self.exercise_id
    }

    /// Members in insertion order.
    pub fn members(&self) -> &[SetMember] {
        &self.members
    }

    /// The element every candidate is compared against.
    pub fn prototype(&self) -> &Element {
        &self.members[0].element
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains_submission(&self, submission_id: i64) -> bool {
        self.submissions.contains(&submission_id)
    }

    /// Adds a member; refuses a second element of a submission already present.
    pub(crate) fn push(&mut self, member: SetMember) -> bool {
        if !self.submissions.insert(member.submission_id) {
            return false;
        }
        self.members.push(member);
        true
    }

    pub async fn representative(&self) -> Option<Representative> {
        self.representative.read().await.clone()
    }

    /// Recomputes the representative while holding this set's write lock, so concurrent
    /// recomputations of the same set are serialized.
    pub async fn recompute<F>(&self, compute: F) -> Option<Representative>
    where
        F: FnOnce(&[SetMember]) -> Option<Representative>,
    {
        let mut guard = self.representative.write().await;
        *guard = compute(&self.members);
        guard.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(submission_id: i64, name: &str) -> SetMember {
        SetMember {
            submission_id,
            element: Element::new(format!("Class:{name}"), "Class", name, ""),
        }
    }

    #[test]
    fn test_same_submission_is_refused() {
        let mut set = SimilaritySet::new(1, 1, member(1, "Car"));
        assert!(set.push(member(2, "Car")));
        assert!(!set.push(member(2, "Cars")));
        assert_eq!(set.len(), 2);
        assert_eq!(set.prototype().name, "Car");
    }

    #[tokio::test]
    async fn test_clones_share_representative() {
        let set = SimilaritySet::new(1, 1, member(1, "Car"));
        let clone = set.clone();
        set.recompute(|members| {
            Some(Representative {
                credits: members.len() as f64,
                text: None,
                grading_instruction_id: None,
                confidence: 1.0,
            })
        })
        .await;
        assert_eq!(clone.representative().await.map(|r| r.credits), Some(1.0));
    }
}
