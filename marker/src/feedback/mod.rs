//! # Feedback Module
//!
//! Handling of feedback submitted by assessors.
//!
//! - [`input`]: the validated shape of incoming feedback.
//! - [`reconcile`]: classification of incoming feedback against what the result held before.

pub mod input;
pub mod reconcile;

pub use input::FeedbackInput;
pub use reconcile::reconcile_feedback;
