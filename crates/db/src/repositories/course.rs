//! Course repository.

use std::sync::Arc;

use crate::entities::{course, Course};
use enrol_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, EntityTrait};

/// Course repository for database operations.
#[derive(Clone)]
pub struct CourseRepository {
    db: Arc<DatabaseConnection>,
}

impl CourseRepository {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a course by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<course::Model>> {
        Course::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a course by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<course::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CourseNotFound(id.to_string()))
    }
}
