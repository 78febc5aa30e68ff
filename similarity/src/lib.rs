//! Element extraction and similarity clustering for automatic assessment.
//!
//! Submissions are split into [`Element`](db::models::Element)s per exercise kind and
//! grouped into [`SimilaritySet`]s of equivalent elements drawn from different
//! submissions. Sets cache a [`Representative`] feedback that the marker computes.

pub mod error;
pub mod extraction;
pub mod index;
pub mod matcher;
pub mod set;

pub use error::SimilarityError;
pub use extraction::Extract;
pub use index::{BuildSummary, ExerciseIndex, SimilarityIndex};
pub use matcher::{ElementMatcher, NameSimilarityMatcher};
pub use set::{Representative, SetMember, SimilaritySet};
