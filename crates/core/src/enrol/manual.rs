//! Manual enrolment: staff enrol users into a course.

use async_trait::async_trait;
use enrol_common::AppResult;
use enrol_db::entities::{enrol_instance, user_enrolment};

use super::method::{EnrolMethod, EnrolmentStore};
use crate::context::RequestContext;

/// Tag of the manual enrolment method.
pub const MANUAL_METHOD: &str = "manual";

/// The `manual` enrolment method.
#[derive(Clone)]
pub struct ManualEnrolMethod {
    store: EnrolmentStore,
}

impl ManualEnrolMethod {
    #[must_use]
    pub const fn new(store: EnrolmentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EnrolMethod for ManualEnrolMethod {
    fn name(&self) -> &'static str {
        MANUAL_METHOD
    }

    fn display_name(&self) -> &'static str {
        "Manual enrolments"
    }

    async fn enrol_user(
        &self,
        ctx: &RequestContext,
        instance: &enrol_instance::Model,
        user_id: &str,
        _group_id: Option<&str>,
    ) -> AppResult<user_enrolment::Model> {
        self.store.add(instance, user_id, ctx.now).await
    }

    async fn unenrol_user(&self, instance: &enrol_instance::Model, user_id: &str) -> AppResult<()> {
        self.store.remove(instance, user_id).await
    }

    fn allow_unenrol_user(
        &self,
        _instance: &enrol_instance::Model,
        _enrolment: &user_enrolment::Model,
    ) -> bool {
        true
    }
}
