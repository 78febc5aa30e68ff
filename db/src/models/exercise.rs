use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How an exercise's points count towards the course score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IncludedInOverallScore {
    #[default]
    IncludedCompletely,
    IncludedAsBonus,
    NotIncluded,
}

/// Diagram flavours a modeling exercise may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DiagramType {
    ClassDiagram,
    ActivityDiagram,
    ObjectDiagram,
    UseCaseDiagram,
    CommunicationDiagram,
    ComponentDiagram,
    DeploymentDiagram,
    PetriNet,
    SyntaxTree,
    Flowchart,
}

/// The closed set of exercise kinds.
///
/// Element extraction is resolved per variant; kinds that carry no structured content
/// cannot take part in automatic assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseKind {
    Modeling { diagram_type: DiagramType },
    Text,
    FileUpload,
    Programming,
}

impl ExerciseKind {
    /// Whether submissions of this kind can be split into elements.
    pub fn supports_elements(&self) -> bool {
        matches!(self, ExerciseKind::Modeling { .. } | ExerciseKind::Text)
    }
}

/// Exercise configuration consumed by the assessment engine.
///
/// Courses and exercises are owned by another part of the system; this is a read-only
/// view of the fields grading depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    /// `None` when the exercise is not linked to a course (score computation is impossible).
    pub course_id: Option<i64>,
    pub title: String,
    pub kind: ExerciseKind,
    pub max_points: f64,
    pub bonus_points: f64,
    pub included_in_overall_score: IncludedInOverallScore,
    pub due_date: Option<DateTime<Utc>>,
    pub assessment_due_date: Option<DateTime<Utc>>,
    /// Number of independent grading passes; at least one.
    pub correction_round_count: i32,
}

impl Model {
    /// True once the assessment due date lies in the past relative to `now`.
    pub fn is_assessment_due_date_over(&self, now: DateTime<Utc>) -> bool {
        self.assessment_due_date.is_some_and(|due| due < now)
    }

    pub fn has_correction_round(&self, round: i32) -> bool {
        round >= 0 && round < self.correction_round_count.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn exercise() -> Model {
        Model {
            id: 1,
            course_id: Some(1),
            title: "Class diagram".into(),
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

    #[test]
    fn test_assessment_due_date_over() {
        let now = Utc::now();
        let mut ex = exercise();
        assert!(!ex.is_assessment_due_date_over(now));
        ex.assessment_due_date = Some(now - Duration::hours(1));
        assert!(ex.is_assessment_due_date_over(now));
        ex.assessment_due_date = Some(now + Duration::hours(1));
        assert!(!ex.is_assessment_due_date_over(now));
    }

    #[test]
    fn test_correction_rounds() {
        let mut ex = exercise();
        assert!(ex.has_correction_round(0));
        assert!(!ex.has_correction_round(1));
        ex.correction_round_count = 2;
        assert!(ex.has_correction_round(1));
        assert!(!ex.has_correction_round(-1));
    }

    #[test]
    fn test_inclusion_mode_parsing() {
        assert_eq!(
            IncludedInOverallScore::from_str("included_as_bonus").unwrap(),
            IncludedInOverallScore::IncludedAsBonus
        );
        assert_eq!(IncludedInOverallScore::NotIncluded.to_string(), "NOT_INCLUDED");
    }
}
