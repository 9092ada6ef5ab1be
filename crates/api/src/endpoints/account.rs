//! Endpoints about the calling user.

use axum::{Router, extract::State, routing::get};
use enrol_common::AppResult;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Session key response.
#[derive(Serialize)]
pub struct SessionKeyResponse {
    pub sesskey: String,
}

/// Session key for state-changing pages such as the unenrol confirmation.
async fn session_key(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SessionKeyResponse>> {
    Ok(ApiResponse::ok(SessionKeyResponse {
        sesskey: state.user_service.session_key(&user),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/sesskey", get(session_key))
}
