//! Seeding helpers shared by the unit and integration tests of every crate.

use crate::models::{
    course_role::Role,
    exercise::{self, DiagramType, ExerciseKind, IncludedInOverallScore},
    participation::Owner,
    submission,
};
use crate::store::{Store, Tables};
use chrono::Utc;
use serde_json::json;

pub fn setup_test_store() -> Store {
    Store::new()
}

/// A class-diagram exercise worth 10 points with a single correction round.
pub fn class_exercise(id: i64, course_id: i64) -> exercise::Model {
    exercise::Model {
        id,
        course_id: Some(course_id),
        title: format!("Class diagram {id}"),
        kind: ExerciseKind::Modeling {
            diagram_type: DiagramType::ClassDiagram,
        },
        max_points: 10.0,
        bonus_points: 0.0,
        included_in_overall_score: IncludedInOverallScore::IncludedCompletely,
        due_date: None,
        assessment_due_date: None,
        correction_round_count: 1,
    }
}

pub fn seed_exercise(tables: &mut Tables, id: i64, course_id: i64) -> exercise::Model {
    let exercise = class_exercise(id, course_id);
    tables.upsert_exercise(exercise.clone());
    exercise
}

/// Creates a participation for a fresh student and a submitted submission with `content`.
pub fn seed_submission(
    tables: &mut Tables,
    exercise_id: i64,
    content: Option<&str>,
) -> submission::Model {
    let student_id = 10_000 + tables.submissions_for_exercise(exercise_id).count() as i64;
    let participation = tables.create_participation(exercise_id, Owner::Student(student_id));
    tables
        .create_submission(
            exercise_id,
            participation.id,
            content.map(str::to_string),
            true,
            Some(Utc::now()),
        )
        .expect("exercise must be seeded before its submissions")
}

pub fn seed_role(tables: &mut Tables, user_id: i64, course_id: i64, role: Role) {
    tables.assign_role(user_id, course_id, role);
}

/// One node of a test model: `(id, type, name, owner id)`.
pub type ModelNode<'a> = (&'a str, &'a str, &'a str, Option<&'a str>);

/// One edge of a test model: `(id, type, source id, target id)`.
pub type ModelEdge<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Renders a diagram payload in the JSON shape the modeling extractor understands.
pub fn model_json(nodes: &[ModelNode<'_>], edges: &[ModelEdge<'_>]) -> String {
    let elements: Vec<_> = nodes
        .iter()
        .map(|(id, kind, name, owner)| {
            json!({ "id": id, "type": kind, "name": name, "owner": owner })
        })
        .collect();
    let relationships: Vec<_> = edges
        .iter()
        .map(|(id, kind, source, target)| {
            json!({
                "id": id,
                "type": kind,
                "source": { "element": source },
                "target": { "element": target },
            })
        })
        .collect();

    json!({ "elements": elements, "relationships": relationships }).to_string()
}

/// A model with a single class, the shape most suggestion tests revolve around.
pub fn one_class_model() -> String {
    model_json(&[("6aba5764", "Class", "Car", None)], &[])
}
