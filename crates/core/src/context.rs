//! Per-request context.

use chrono::{DateTime, Utc};
use enrol_db::entities::user;

/// The acting user and the instant the request is evaluated at.
///
/// Built once by the API layer and passed explicitly to every service call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Authenticated user.
    pub user: user::Model,
    /// Evaluation time; enrolment windows are checked against it.
    pub now: DateTime<Utc>,
}

impl RequestContext {
    /// Context for a request arriving now.
    #[must_use]
    pub fn new(user: user::Model) -> Self {
        Self::at(user, Utc::now())
    }

    /// Context pinned to a fixed instant.
    #[must_use]
    pub const fn at(user: user::Model, now: DateTime<Utc>) -> Self {
        Self { user, now }
    }

    /// ID of the acting user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Whether the acting user is a site administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}
