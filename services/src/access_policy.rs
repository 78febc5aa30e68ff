use db::models::course_role::Role;
use db::Tables;

/// Privilege checks consumed by the coordinator.
///
/// Checks run against the same table snapshot the calling operation works on, so a
/// role change cannot slip in between the check and the write.
pub trait AccessPolicy: Send + Sync {
    fn is_at_least_tutor_in_course(&self, tables: &Tables, user_id: i64, course_id: i64) -> bool;

    fn is_at_least_instructor_in_course(
        &self,
        tables: &Tables,
        user_id: i64,
        course_id: i64,
    ) -> bool;
}

/// Reads roles from the course membership table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CourseRoleAccess;

impl CourseRoleAccess {
    fn has_role(tables: &Tables, user_id: i64, course_id: i64, role: Role) -> bool {
        tables
            .role(user_id, course_id)
            .is_some_and(|actual| actual >= role)
    }
}

impl AccessPolicy for CourseRoleAccess {
    fn is_at_least_tutor_in_course(&self, tables: &Tables, user_id: i64, course_id: i64) -> bool {
        Self::has_role(tables, user_id, course_id, Role::Tutor)
    }

    fn is_at_least_instructor_in_course(
        &self,
        tables: &Tables,
        user_id: i64,
        course_id: i64,
    ) -> bool {
        Self::has_role(tables, user_id, course_id, Role::Instructor)
    }
}
