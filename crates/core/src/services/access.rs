//! Course capability checks.

use enrol_common::AppResult;
use enrol_db::entities::course;
use enrol_db::entities::role_assignment::CourseRole;
use enrol_db::repositories::{RoleAssignmentRepository, UserEnrolmentRepository};

use crate::context::RequestContext;
use crate::enrol::MANUAL_METHOD;

/// Answers what the acting user may do in a course.
#[derive(Clone)]
pub struct AccessService {
    role_repo: RoleAssignmentRepository,
    enrolment_repo: UserEnrolmentRepository,
}

impl AccessService {
    /// Create a new access service.
    #[must_use]
    pub const fn new(
        role_repo: RoleAssignmentRepository,
        enrolment_repo: UserEnrolmentRepository,
    ) -> Self {
        Self {
            role_repo,
            enrolment_repo,
        }
    }

    /// Whether the user may see the course's summary.
    pub async fn can_view_course_info(
        &self,
        ctx: &RequestContext,
        course: &course::Model,
    ) -> AppResult<bool> {
        if course.visible || ctx.is_admin() {
            return Ok(true);
        }
        let roles = self.role_repo.find_roles(&course.id, ctx.user_id()).await?;
        Ok(!roles.is_empty())
    }

    /// Whether the user may enter the course.
    pub async fn can_access_course(
        &self,
        ctx: &RequestContext,
        course: &course::Model,
    ) -> AppResult<bool> {
        if ctx.is_admin() {
            return Ok(true);
        }
        let roles = self.role_repo.find_roles(&course.id, ctx.user_id()).await?;
        if !roles.is_empty() {
            return Ok(true);
        }
        self.enrolment_repo
            .has_active_in_course(&course.id, ctx.user_id())
            .await
    }

    /// Whether the user may remove enrolments of `method` from the course.
    pub async fn has_unenrol_capability(
        &self,
        ctx: &RequestContext,
        course: &course::Model,
        method: &str,
    ) -> AppResult<bool> {
        if ctx.is_admin() {
            return Ok(true);
        }
        let roles = self.role_repo.find_roles(&course.id, ctx.user_id()).await?;
        Ok(roles.iter().any(|role| match role {
            CourseRole::Manager => true,
            CourseRole::Teacher => method == MANUAL_METHOD,
            CourseRole::Student => false,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{context, course, user};
    use enrol_db::entities::role_assignment;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(role_db: MockDatabase, enrolment_db: MockDatabase) -> AccessService {
        AccessService::new(
            RoleAssignmentRepository::new(Arc::new(role_db.into_connection())),
            UserEnrolmentRepository::new(Arc::new(enrolment_db.into_connection())),
        )
    }

    fn empty() -> MockDatabase {
        MockDatabase::new(DatabaseBackend::Postgres)
    }

    fn role(role: CourseRole) -> role_assignment::Model {
        role_assignment::Model {
            id: "r1".to_string(),
            course_id: "c1".to_string(),
            user_id: "u1".to_string(),
            role,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_visible_course_needs_no_queries() {
        let access = service(empty(), empty());
        let ctx = context(user("u1"));

        assert!(access.can_view_course_info(&ctx, &course("c1", true)).await.unwrap());
    }

    #[tokio::test]
    async fn test_hidden_course_requires_role() {
        let access = service(
            empty()
                .append_query_results([Vec::<role_assignment::Model>::new()])
                .append_query_results([[role(CourseRole::Student)]]),
            empty(),
        );
        let ctx = context(user("u1"));
        let hidden = course("c1", false);

        assert!(!access.can_view_course_info(&ctx, &hidden).await.unwrap());
        assert!(access.can_view_course_info(&ctx, &hidden).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_sees_everything() {
        let access = service(empty(), empty());
        let mut admin = user("admin");
        admin.is_admin = true;
        let ctx = context(admin);
        let hidden = course("c1", false);

        assert!(access.can_view_course_info(&ctx, &hidden).await.unwrap());
        assert!(access.can_access_course(&ctx, &hidden).await.unwrap());
        assert!(access.has_unenrol_capability(&ctx, &hidden, "self").await.unwrap());
    }

    #[tokio::test]
    async fn test_access_through_active_enrolment() {
        let access = service(
            empty().append_query_results([Vec::<role_assignment::Model>::new()]),
            empty().append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1)),
            }]]),
        );
        let ctx = context(user("u1"));

        assert!(access.can_access_course(&ctx, &course("c1", false)).await.unwrap());
    }

    #[tokio::test]
    async fn test_unenrol_capability_by_role() {
        let access = service(
            empty()
                .append_query_results([[role(CourseRole::Teacher)]])
                .append_query_results([[role(CourseRole::Teacher)]])
                .append_query_results([[role(CourseRole::Manager)]])
                .append_query_results([[role(CourseRole::Student)]]),
            empty(),
        );
        let ctx = context(user("u1"));
        let c = course("c1", true);

        assert!(access.has_unenrol_capability(&ctx, &c, "manual").await.unwrap());
        assert!(!access.has_unenrol_capability(&ctx, &c, "self").await.unwrap());
        assert!(access.has_unenrol_capability(&ctx, &c, "self").await.unwrap());
        assert!(!access.has_unenrol_capability(&ctx, &c, "manual").await.unwrap());
    }
}
