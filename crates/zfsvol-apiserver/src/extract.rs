use crate::ApiError;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

/// JSON body extractor tolerant of Docker's request quirks
///
/// Docker posts bodies with its own media type and sometimes with no body
/// at all (List, Capabilities), so the content type is ignored and an empty
/// body decodes as `T::default()`.
#[derive(Debug)]
pub struct PluginRequest<T>(pub T);

impl<S, T> FromRequest<S> for PluginRequest<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {}", e)))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let value = serde_json::from_slice(&body)?;
        Ok(Self(value))
    }
}
