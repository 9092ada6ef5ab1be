//! Role assignment repository.

use std::sync::Arc;

use crate::entities::role_assignment::CourseRole;
use crate::entities::{role_assignment, RoleAssignment};
use enrol_common::{AppError, AppResult};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

/// Role assignment repository for database operations.
#[derive(Clone)]
pub struct RoleAssignmentRepository {
    db: Arc<DatabaseConnection>,
}

impl RoleAssignmentRepository {
    /// Create a new role assignment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Roles a user holds in a course.
    pub async fn find_roles(&self, course_id: &str, user_id: &str) -> AppResult<Vec<CourseRole>> {
        let assignments = RoleAssignment::find()
            .filter(role_assignment::Column::CourseId.eq(course_id))
            .filter(role_assignment::Column::UserId.eq(user_id))
            .limit(16)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(assignments.into_iter().map(|a| a.role).collect())
    }
}
