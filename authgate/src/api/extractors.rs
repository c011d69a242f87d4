//! Request body extractors.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::errors::Error;

/// JSON body that may be absent.
///
/// An empty body deserializes to `T::default()`, so endpoints that also read cookies work for
/// clients that send no body at all. The content type isn't checked. A non-empty body that isn't
/// valid JSON for `T` is a 400.
#[derive(Debug, Clone, Default)]
pub struct OptionalJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read request body: {e}"),
        })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes).map(Self).map_err(|e| Error::BadRequest {
            message: format!("Invalid JSON body: {e}"),
        })
    }
}
