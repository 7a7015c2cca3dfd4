//! Session introspection for authenticated users.

use axum::{extract::Extension, response::Json};

use crate::middleware::RequestIdentity;

/// Echo the identity the auth gate attached to this request.
pub async fn whoami(Extension(identity): Extension<RequestIdentity>) -> Json<RequestIdentity> {
    Json(identity)
}
