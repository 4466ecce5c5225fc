//! API response types.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper.
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
        Json(self).into_response()
    }
}

/// Acknowledgement body for mutations without a payload.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Done {
    pub ok: bool,
}

impl ApiResponse<Done> {
    /// `{"data":{"ok":true}}`
    #[must_use]
    pub const fn done() -> Self {
        Self::ok(Done { ok: true })
    }
}
