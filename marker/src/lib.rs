//! # Marker Library
//!
//! Grading logic of the assessment engine: scoring, confidence policies, the suggestion
//! engine and reconciliation of assessor overrides.
//!
//! ## Key Concepts
//! - **SuggestionEngine**: turns similarity set representatives into suggested results.
//! - **ConfidencePolicy**: decides when assessor feedback on a set agrees enough to suggest.
//! - **Reconciliation**: classifies submitted feedback as manual, automatic or adapted.
//! - **Scorer**: converts feedback credits into a percentage score with bonus ceilings.

pub mod confidence;
pub mod error;
pub mod feedback;
pub mod scorer;
pub mod suggestion;
pub mod traits;
pub mod types;

pub use error::AssessmentError;
pub use suggestion::SuggestionEngine;
pub use types::Suggestion;
