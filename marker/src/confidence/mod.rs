//! # Confidence Policies
//!
//! Implementations of [`ConfidencePolicy`](crate::traits::confidence::ConfidencePolicy).
//!
//! ## Available Policies
//!
//! - [`majority_agreement`]: suggests the majority credit value once enough samples agree.

pub mod majority_agreement;

pub use majority_agreement::MajorityAgreement;
