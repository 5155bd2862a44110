//! Caller identity as forwarded by the authentication gateway.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::parse_field;
use crate::domain::{Actor, ProfileId, Role};
use crate::error::AppError;

pub const PROFILE_HEADER: &str = "x-profile-id";
pub const ROLE_HEADER: &str = "x-role";

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let profile_id: ProfileId = parse_field(PROFILE_HEADER, header(parts, PROFILE_HEADER)?)?;
        let role: Role = parse_field(ROLE_HEADER, header(parts, ROLE_HEADER)?)?;
        Ok(Actor { profile_id, role })
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", name)))?
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} header", name)))
}

/// Reject non-administrators.
pub fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if actor.role.is_privileged() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} is not an administrator",
            actor.profile_id
        )))
    }
}
