//! Authorization gate: a stateless role check composed after the auth gate.

use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::RequestIdentity;
use crate::error::ApiError;
use crate::models::Role;

/// Pure decision function: permit when an identity is attached and its role
/// is in the allowed set. No side effects.
pub fn authorize(identity: Option<&RequestIdentity>, allowed: &[Role]) -> Result<(), ApiError> {
    let identity = identity.ok_or(ApiError::Unauthenticated)?;
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    authorize(request.extensions().get::<RequestIdentity>(), &[Role::Admin])?;
    Ok(next.run(request).await)
}
