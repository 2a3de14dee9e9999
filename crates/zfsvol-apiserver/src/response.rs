use crate::protocol::{ErrResponse, PLUGIN_CONTENT_TYPE};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Successful plugin response, tagged with the plugin media type
pub struct PluginResponse<T: Serialize> {
    body: T,
}

impl<T: Serialize> PluginResponse<T> {
    /// Create a new response with 200 OK
    pub fn ok(body: T) -> Self {
        Self { body }
    }
}

impl<T: Serialize> IntoResponse for PluginResponse<T> {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)],
            Json(self.body),
        )
            .into_response()
    }
}

/// Success response for calls that only return an error slot
pub fn no_error() -> Response {
    PluginResponse::ok(ErrResponse::default()).into_response()
}
