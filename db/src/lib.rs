//! Storage for the assessment engine.
//!
//! Courses, exercises and submissions are managed elsewhere; this crate only holds the
//! models grading reads and the results and feedback it writes.

pub mod models;
pub mod store;
pub mod test_utils;

pub use store::{Store, StoreError, Tables};
