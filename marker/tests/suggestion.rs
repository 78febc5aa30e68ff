use chrono::Utc;
use db::models::{feedback::FeedbackType, result::AssessmentType, Feedback};
use db::test_utils::{model_json, one_class_model, seed_exercise, seed_submission};
use db::Tables;
use marker::SuggestionEngine;
use common::AssessmentConfig;

const CLASS: &str = "Class:6aba5764";

fn manual(reference: &str, credits: f64, text: &str) -> Feedback {
    Feedback {
        credits: Some(credits),
        text: Some(text.to_string()),
        feedback_type: FeedbackType::Manual,
        reference: Some(reference.to_string()),
        grading_instruction_id: None,
    }
}

/// Stores a completed round-0 result for the submission.
fn complete(tables: &mut Tables, submission_id: i64, feedbacks: Vec<Feedback>) {
    let result = tables
        .create_result(submission_id, 0, Some(1), feedbacks)
        .unwrap();
    let stored = tables.result_mut(result.id).unwrap();
    stored.completion_date = Some(Utc::now());
    stored.rated = Some(true);
}

fn engine() -> SuggestionEngine {
    SuggestionEngine::from_config(&AssessmentConfig::default())
}

#[tokio::test]
async fn test_no_suggestion_before_build() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);
    let graded = seed_submission(&mut tables, 1, Some(&one_class_model()));
    complete(&mut tables, graded.id, vec![manual(CLASS, 1.0, "good")]);
    let open = seed_submission(&mut tables, 1, Some(&one_class_model()));

    let engine = engine();
    assert_eq!(engine.suggest(&tables, open.id).await.unwrap(), None);

    engine.build(&tables, 1).await.unwrap();
    assert!(engine.suggest(&tables, open.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_confidence_grows_with_agreeing_feedback() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);
    let engine = engine();

    let first = seed_submission(&mut tables, 1, Some(&one_class_model()));
    complete(&mut tables, first.id, vec![manual(CLASS, 20.0, "wrong text")]);
    let target = seed_submission(&mut tables, 1, Some(&one_class_model()));
    engine.build(&tables, 1).await.unwrap();

    let suggestion = engine.suggest(&tables, target.id).await.unwrap().unwrap();
    assert_eq!(suggestion.feedbacks.len(), 1);
    assert_eq!(suggestion.feedbacks[0].credits, Some(20.0));
    assert_eq!(suggestion.feedbacks[0].text.as_deref(), Some("wrong text"));
    assert_eq!(suggestion.feedbacks[0].feedback_type, FeedbackType::Automatic);
    assert_eq!(suggestion.assessment_type, AssessmentType::SemiAutomatic);
    assert_eq!(suggestion.rated, None);
    assert_eq!(suggestion.assessor_id, None);
    assert_eq!(suggestion.completion_date, None);

    for text in ["short", "medium text", "very long feedback text"] {
        let other = seed_submission(&mut tables, 1, Some(&one_class_model()));
        engine.on_new_submission(&tables, other.id).await.unwrap();
        complete(&mut tables, other.id, vec![manual(CLASS, 1.0, text)]);
        engine.refresh_submission(&tables, 1, other.id).await;
        assert_eq!(engine.suggest(&tables, target.id).await.unwrap(), None);
    }

    let last = seed_submission(&mut tables, 1, Some(&one_class_model()));
    engine.on_new_submission(&tables, last.id).await.unwrap();
    complete(&mut tables, last.id, vec![manual(CLASS, 1.0, "tiny")]);
    engine.refresh_submission(&tables, 1, last.id).await;

    let suggestion = engine.suggest(&tables, target.id).await.unwrap().unwrap();
    assert_eq!(suggestion.feedbacks[0].credits, Some(1.0));
    assert_eq!(
        suggestion.feedbacks[0].text.as_deref(),
        Some("very long feedback text")
    );
    assert_eq!(suggestion.score, 10.0);
}

#[tokio::test]
async fn test_partial_suggestion_for_different_context() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);

    let graded = model_json(
        &[
            ("c1", "Class", "Car", None),
            ("a1", "ClassAttribute", "wheels", Some("c1")),
        ],
        &[],
    );
    let moved = model_json(
        &[
            ("c1", "Class", "Car", None),
            ("c2", "Class", "Truck", None),
            ("a1", "ClassAttribute", "wheels", Some("c2")),
        ],
        &[],
    );

    let first = seed_submission(&mut tables, 1, Some(&graded));
    complete(
        &mut tables,
        first.id,
        vec![
            manual("Class:c1", 1.0, "class ok"),
            manual("ClassAttribute:a1", 0.5, "attribute ok"),
        ],
    );
    let target = seed_submission(&mut tables, 1, Some(&moved));

    let engine = engine();
    engine.build(&tables, 1).await.unwrap();

    let suggestion = engine.suggest(&tables, target.id).await.unwrap().unwrap();
    let references: Vec<_> = suggestion
        .feedbacks
        .iter()
        .filter_map(|f| f.reference.as_deref())
        .collect();
    assert_eq!(references, vec!["Class:c1"]);
}

#[tokio::test]
async fn test_equivalent_elements_share_one_suggestion_before_and_after_indexing() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);
    let graded = seed_submission(&mut tables, 1, Some(&one_class_model()));
    complete(&mut tables, graded.id, vec![manual(CLASS, 1.0, "good")]);

    let engine = engine();
    engine.build(&tables, 1).await.unwrap();

    let twins = model_json(
        &[("t1", "Class", "Car", None), ("t2", "Class", "car", None)],
        &[],
    );
    let target = seed_submission(&mut tables, 1, Some(&twins));

    let references = |feedbacks: &[Feedback]| -> Vec<String> {
        feedbacks.iter().filter_map(|f| f.reference.clone()).collect()
    };

    let unindexed = engine.suggest(&tables, target.id).await.unwrap().unwrap();
    assert_eq!(references(&unindexed.feedbacks), vec!["Class:t1"]);

    engine.on_new_submission(&tables, target.id).await.unwrap();
    let indexed = engine.suggest(&tables, target.id).await.unwrap().unwrap();
    assert_eq!(references(&indexed.feedbacks), vec!["Class:t1"]);
    assert_eq!(indexed.score, unindexed.score);
}

#[tokio::test]
async fn test_completed_submissions_get_no_suggestion() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);
    let a = seed_submission(&mut tables, 1, Some(&one_class_model()));
    let b = seed_submission(&mut tables, 1, Some(&one_class_model()));
    complete(&mut tables, a.id, vec![manual(CLASS, 1.0, "x")]);
    complete(&mut tables, b.id, vec![manual(CLASS, 1.0, "x")]);

    let engine = engine();
    engine.build(&tables, 1).await.unwrap();
    assert_eq!(engine.suggest(&tables, b.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_empty_submission_gets_no_suggestion() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);
    let graded = seed_submission(&mut tables, 1, Some(&one_class_model()));
    complete(&mut tables, graded.id, vec![manual(CLASS, 1.0, "x")]);
    let empty = seed_submission(&mut tables, 1, None);

    let engine = engine();
    engine.build(&tables, 1).await.unwrap();
    assert_eq!(engine.suggest(&tables, empty.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_conflicting_feedback_suppresses_suggestion() {
    let mut tables = Tables::default();
    seed_exercise(&mut tables, 1, 1);
    let a = seed_submission(&mut tables, 1, Some(&one_class_model()));
    let b = seed_submission(&mut tables, 1, Some(&one_class_model()));
    let target = seed_submission(&mut tables, 1, Some(&one_class_model()));
    complete(&mut tables, a.id, vec![manual(CLASS, 1.0, "x")]);
    complete(&mut tables, b.id, vec![manual(CLASS, 2.0, "y")]);

    let engine = engine();
    engine.build(&tables, 1).await.unwrap();
    assert_eq!(engine.suggest(&tables, target.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_unknown_submission() {
    let tables = Tables::default();
    assert!(engine().suggest(&tables, 404).await.is_err());
}
