//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use enrol_core::{SelfEnrolmentService, SettingsTestService, UnenrolmentService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub self_enrolment_service: SelfEnrolmentService,
    pub unenrolment_service: UnenrolmentService,
    pub settings_test_service: SettingsTestService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token pass through
/// unauthenticated; extractors reject them where a user is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    if let Some(token) = token {
        match state.user_service.authenticate_by_token(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) if e.is_server_error() => {
                tracing::error!(error = %e, "Token authentication failed");
            }
            Err(_) => {
                tracing::debug!("Unknown or suspended token");
            }
        }
    }

    next.run(req).await
}
