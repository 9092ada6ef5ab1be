//! Enrolment instance repository.

use std::sync::Arc;

use crate::entities::enrol_instance::InstanceStatus;
use crate::entities::{enrol_instance, EnrolInstance};
use enrol_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Enrolment instance repository for database operations.
#[derive(Clone)]
pub struct EnrolInstanceRepository {
    db: Arc<DatabaseConnection>,
}

impl EnrolInstanceRepository {
    /// Create a new enrolment instance repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an instance by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<enrol_instance::Model>> {
        EnrolInstance::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an instance by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<enrol_instance::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::InstanceNotFound(id.to_string()))
    }

    /// Instances of a course in display order (`sort_order`, then id).
    pub async fn find_by_course(
        &self,
        course_id: &str,
        enabled_only: bool,
    ) -> AppResult<Vec<enrol_instance::Model>> {
        let mut query = EnrolInstance::find().filter(enrol_instance::Column::CourseId.eq(course_id));

        if enabled_only {
            query = query.filter(enrol_instance::Column::Status.eq(InstanceStatus::Enabled));
        }

        query
            .order_by_asc(enrol_instance::Column::SortOrder)
            .order_by_asc(enrol_instance::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All instances of one method across the site.
    pub async fn find_by_method(&self, method: &str) -> AppResult<Vec<enrol_instance::Model>> {
        EnrolInstance::find()
            .filter(enrol_instance::Column::Method.eq(method))
            .order_by_asc(enrol_instance::Column::CourseId)
            .order_by_asc(enrol_instance::Column::SortOrder)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new instance.
    pub async fn create(
        &self,
        model: enrol_instance::ActiveModel,
    ) -> AppResult<enrol_instance::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
