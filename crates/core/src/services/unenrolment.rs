//! Unenrolment confirmation page.

use std::sync::Arc;

use enrol_common::{AppError, AppResult, SessionKeys};
use enrol_db::repositories::{
    CourseRepository, EnrolInstanceRepository, UserEnrolmentRepository, UserRepository,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use url::form_urlencoded;

use super::access::AccessService;
use crate::context::RequestContext;
use crate::enrol::EnrolRegistry;

/// Path of the unenrol page itself.
pub const UNENROL_PATH: &str = "/api/enrol/unenrol";

/// Query of the unenrol page.
#[derive(Debug, Default, Deserialize)]
pub struct UnenrolRequest {
    /// User enrolment ID.
    pub ue: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub confirm: bool,
    pub sesskey: Option<String>,
    /// Participant filter to carry back to the page.
    pub ifilter: Option<String>,
}

/// Accept `1`/`0` as well as `true`/`false`; anything else is false.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(matches!(
        raw.as_deref().map(str::trim),
        Some("1" | "true" | "yes" | "on")
    ))
}

/// Confirmation prompt shown before removing an enrolment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnenrolConfirmation {
    pub title: String,
    /// Full name of the user being unenrolled.
    pub heading: String,
    pub message: String,
    pub confirm_url: String,
    pub cancel_url: String,
}

/// What the page does for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnenrolOutcome {
    /// Ask for confirmation; nothing was changed.
    Confirm(UnenrolConfirmation),
    /// The enrolment was removed; go to this URL.
    Redirect(String),
}

/// Participants page of a course.
#[must_use]
pub fn participants_url(course_id: &str) -> String {
    format!("/course/{course_id}/participants")
}

/// Removes one user enrolment after confirmation.
#[derive(Clone)]
pub struct UnenrolmentService {
    enrolment_repo: UserEnrolmentRepository,
    user_repo: UserRepository,
    instance_repo: EnrolInstanceRepository,
    course_repo: CourseRepository,
    access: AccessService,
    registry: Arc<EnrolRegistry>,
    session_keys: SessionKeys,
}

impl UnenrolmentService {
    /// Create a new unenrolment service.
    #[must_use]
    pub const fn new(
        enrolment_repo: UserEnrolmentRepository,
        user_repo: UserRepository,
        instance_repo: EnrolInstanceRepository,
        course_repo: CourseRepository,
        access: AccessService,
        registry: Arc<EnrolRegistry>,
        session_keys: SessionKeys,
    ) -> Self {
        Self {
            enrolment_repo,
            user_repo,
            instance_repo,
            course_repo,
            access,
            registry,
            session_keys,
        }
    }

    /// Handle one visit of the unenrol page.
    ///
    /// Only `confirm` together with the caller's valid session key removes the
    /// enrolment. Anything else, including a wrong key, yields the prompt.
    pub async fn unenrol_page(
        &self,
        ctx: &RequestContext,
        request: UnenrolRequest,
    ) -> AppResult<UnenrolOutcome> {
        let ue_id = request
            .ue
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("ue is required".to_string()))?;

        let enrolment = self
            .enrolment_repo
            .find_by_id(ue_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user enrolment {ue_id}")))?;
        let user = self.user_repo.get_by_id(&enrolment.user_id).await?;
        let instance = self.instance_repo.get_by_id(&enrolment.enrol_id).await?;
        let course = self.course_repo.get_by_id(&instance.course_id).await?;

        let method = self
            .registry
            .get_enabled(&instance.method)
            .ok_or_else(|| AppError::Unsupported("erroreditenrolment".to_string()))?;

        if !method.allow_unenrol_user(&instance, &enrolment)
            || !self
                .access
                .has_unenrol_capability(ctx, &course, &instance.method)
                .await?
        {
            return Err(AppError::Forbidden("erroreditenrolment".to_string()));
        }

        let cancel_url = participants_url(&course.id);

        let key_valid = request
            .sesskey
            .as_deref()
            .is_some_and(|key| self.session_keys.verify(ctx.user_id(), key));
        if request.confirm && key_valid {
            method.unenrol_user(&instance, &user.id).await?;
            info!(
                actor_id = %ctx.user_id(),
                user_id = %user.id,
                course_id = %course.id,
                instance_id = %instance.id,
                "User unenrolled"
            );
            return Ok(UnenrolOutcome::Redirect(cancel_url));
        }

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("ue", &enrolment.id);
        if let Some(filter) = request.ifilter.as_deref().filter(|f| !f.is_empty()) {
            query.append_pair("ifilter", filter);
        }
        query.append_pair("confirm", "1");
        query.append_pair("sesskey", &self.session_keys.issue(ctx.user_id()));

        let fullname = user.full_name();
        Ok(UnenrolOutcome::Confirm(UnenrolConfirmation {
            title: "Unenrol".to_string(),
            message: format!(
                "Do you really want to unenrol user \"{}\" (enrolled via \"{}\") from \"{}\"?",
                fullname,
                method.instance_name(&instance),
                course.full_name
            ),
            heading: fullname,
            confirm_url: format!("{UNENROL_PATH}?{}", query.finish()),
            cancel_url,
        }))
    }
}
