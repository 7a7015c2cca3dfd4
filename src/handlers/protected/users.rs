//! User management: own-profile access for any authenticated user, listing
//! and role/deletion operations for admins.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::RequestIdentity;
use crate::models::{Role, UserRecord};
use crate::state::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.directory.list().await?;
    Ok(Json(users))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> Result<Json<UserRecord>, ApiError> {
    let record = state
        .directory
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if !body.email.contains('@') {
        return Err(ApiError::BadRequest(
            "Please include a valid email".to_string(),
        ));
    }

    let record = state
        .directory
        .update_profile(&identity.id, body.name.trim(), &body.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateRoleResponse {
    pub message: &'static str,
    pub user: UserRecord,
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>, ApiError> {
    let role = Role::parse(&body.role).ok_or_else(|| {
        ApiError::BadRequest("Role must be either admin or user".to_string())
    })?;

    let user = state
        .directory
        .update_role(&id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %id, %role, "user role updated");

    Ok(Json(UpdateRoleResponse {
        message: "User role updated",
        user,
    }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.directory.delete(&id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, "user deleted");

    Ok(Json(json!({ "message": "User deleted" })))
}
