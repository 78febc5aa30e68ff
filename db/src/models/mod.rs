pub mod course_role;
pub mod element;
pub mod exercise;
pub mod feedback;
pub mod participation;
pub mod result;
pub mod submission;

pub use course_role::Model as CourseRole;
pub use element::Element;
pub use exercise::Model as Exercise;
pub use feedback::Model as Feedback;
pub use participation::Model as Participation;
pub use result::Model as AssessmentResult;
pub use submission::Model as Submission;
