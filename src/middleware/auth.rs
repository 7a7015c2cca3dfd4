//! Authentication gate.
//!
//! Verifies the bearer credential against the identity provider, resolves
//! (or lazily creates) the directory profile, and attaches the normalized
//! identity to the request. Every request reverifies from scratch; there is
//! no cross-request caching.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{Role, UserRecord};
use crate::services::provisioning::resolve_profile;
use crate::state::AppState;
use crate::supabase::{VerifiedIdentity, VerifyError};

/// Normalized identity attached to request extensions once the gate passes.
/// Built fresh per request; `role` and `verified` always come from the
/// directory row, since the identity provider knows nothing about roles.
#[derive(Clone, Debug, Serialize)]
pub struct RequestIdentity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub verified: bool,
}

impl RequestIdentity {
    pub fn from_parts(identity: &VerifiedIdentity, record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            email: identity.email.clone(),
            name: record.name.clone(),
            role: record.role,
            verified: record.verified,
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())?;

    let identity = state
        .verifier
        .verify_token(&token)
        .await
        .map_err(verify_error)?;

    let record = resolve_profile(state.directory.as_ref(), &identity).await?;

    tracing::debug!(user = %identity.email, role = %record.role, "authenticated request");

    request
        .extensions_mut()
        .insert(RequestIdentity::from_parts(&identity, &record));

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// Missing and malformed headers differ only in message.
fn extract_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let header = headers.get(AUTHORIZATION).ok_or_else(|| {
        ApiError::MissingCredential("Authentication required: No token provided".to_string())
    })?;

    let malformed =
        || ApiError::MissingCredential("Authentication required: Invalid token format".to_string());

    let value = header.to_str().map_err(|_| malformed())?;
    let token = value.strip_prefix("Bearer ").ok_or_else(malformed)?;
    if token.trim().is_empty() {
        return Err(malformed());
    }
    Ok(token.to_string())
}

fn verify_error(err: VerifyError) -> ApiError {
    match err {
        VerifyError::SessionExpired => ApiError::SessionExpired,
        VerifyError::Rejected(msg) => {
            tracing::warn!(%msg, "token verification failed");
            ApiError::InvalidCredential
        }
        VerifyError::Transport(msg) => {
            // Fail closed when the verifier is unreachable
            tracing::warn!(%msg, "identity verifier unreachable");
            ApiError::InvalidCredential
        }
    }
}
