//! User service.

use enrol_common::{AppError, AppResult, SessionKeys};
use enrol_db::entities::user;
use enrol_db::repositories::UserRepository;

/// Authentication and per-user session keys.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    session_keys: SessionKeys,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, session_keys: SessionKeys) -> Self {
        Self {
            user_repo,
            session_keys,
        }
    }

    /// Authenticate a user by API token. Suspended users are rejected.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if user.is_suspended {
            return Err(AppError::Unauthorized);
        }
        Ok(user)
    }

    /// Session key the user must present on state-changing pages.
    #[must_use]
    pub fn session_key(&self, user: &user::Model) -> String {
        self.session_keys.issue(&user.id)
    }
}
