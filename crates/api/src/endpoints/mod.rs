//! API endpoints.

mod account;
mod admin;
mod enrol_self;
mod unenrol;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/enrol/self", enrol_self::router())
        .merge(unenrol::router())
        .nest("/admin", admin::router())
        .nest("/i", account::router())
}
