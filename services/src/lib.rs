pub mod access_policy;
pub mod assessment_service;
pub mod lock_coordinator;

pub use access_policy::{AccessPolicy, CourseRoleAccess};
pub use assessment_service::AssessmentService;
pub use lock_coordinator::{LockCoordinator, LockedSubmission, RoundProgress};
