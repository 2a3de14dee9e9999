use crate::protocol::ActivateResponse;
use crate::response::PluginResponse;
use axum::response::{IntoResponse, Response};
use tracing::debug;

/// POST /Plugin.Activate
pub async fn activate() -> Response {
    debug!("Activate");
    PluginResponse::ok(ActivateResponse::default()).into_response()
}
