//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

/// Standard API response wrapper.
///
/// Errors are rendered by `AppError` itself; this only carries success data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Page handlers either render a model or send the browser elsewhere.
#[derive(Debug)]
pub enum PageResponse<T: Serialize> {
    Render(ApiResponse<T>),
    /// `303 See Other`
    Redirect(String),
}

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Render(body) => body.into_response(),
            Self::Redirect(to) => Redirect::to(&to).into_response(),
        }
    }
}
