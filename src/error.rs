//! HTTP API error taxonomy.
//!
//! Every failure surfaced to a client goes through [`ApiError`], which maps
//! to a `{"message": ..., "code"?: ...}` body. External-system error objects
//! are logged server-side and never serialized into responses.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No usable bearer credential on the request. The message distinguishes
    /// a missing header from a malformed one for diagnostics only.
    #[error("{0}")]
    MissingCredential(String),

    /// The identity verifier rejected the credential, or could not be
    /// reached (fail closed).
    #[error("Invalid or expired token")]
    InvalidCredential,

    /// Verifier-reported expired/missing session. Carries the one
    /// machine-readable code clients branch on.
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Role gate ran without an attached identity.
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated but with a custom 401 message (login failures).
    #[error("{0}")]
    Unauthorized(String),

    #[error("You do not have permission to access this resource")]
    Forbidden,

    #[error("Error fetching user profile")]
    ProfileLookupFailed,

    #[error("Error creating user profile")]
    ProfileSetupFailed,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCredential(_)
            | ApiError::InvalidCredential
            | ApiError::SessionExpired
            | ApiError::Unauthenticated
            | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ProfileLookupFailed
            | ApiError::ProfileSetupFailed
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code, present only where clients are expected to
    /// branch on it.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::SessionExpired => Some("SESSION_EXPIRED"),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self.code() {
            Some(code) => json!({ "message": self.to_string(), "code": code }),
            None => json!({ "message": self.to_string() }),
        }
    }
}

impl From<crate::supabase::StoreError> for ApiError {
    fn from(err: crate::supabase::StoreError) -> Self {
        // Backend detail is logged, never forwarded to clients
        tracing::error!(%err, "store backend error");
        ApiError::Internal("Server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, message = %self, "request failed");
        }
        (status, Json(self.to_json())).into_response()
    }
}
