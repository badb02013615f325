//! §6 "Identity headers": the authentication layer in front of this service
//! injects `x-user-id` / `x-user-email` on every authenticated request; this
//! is the one place that reads them. No cookie parsing happens here.

use axum::{extract::FromRequestParts, http::request::Parts};

#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: String,
    pub user_email: String,
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = crate::api::error::ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, "x-user-id")?;
        let user_email = header(parts, "x-user-email")?;
        Ok(Self { user_id, user_email })
    }
}

fn header(parts: &Parts, name: &'static str) -> Result<String, crate::api::error::ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| crate::api::error::ApiError::from(auction_engine::domain::EngineError::Authentication))
}
