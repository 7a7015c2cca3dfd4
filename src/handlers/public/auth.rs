//! Login and registration: thin pass-throughs to the identity provider,
//! sharing the gate's profile-provisioning policy.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::middleware::RequestIdentity;
use crate::models::{NewUserRecord, Role};
use crate::services::provisioning::resolve_profile;
use crate::state::AppState;
use crate::supabase::VerifyError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: RequestIdentity,
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if body.email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let session = state
        .verifier
        .sign_in(&body.email, &body.password)
        .await
        .map_err(|err| match err {
            VerifyError::Rejected(msg) if msg.contains("Invalid login credentials") => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            VerifyError::Rejected(msg) => {
                tracing::warn!(email = %body.email, %msg, "login rejected");
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            other => {
                tracing::error!(%other, "login failed against identity provider");
                ApiError::Internal("Login failed".to_string())
            }
        })?;

    // Same lazy-create and verified-sync policy as the auth gate
    let record = resolve_profile(state.directory.as_ref(), &session.identity).await?;

    tracing::info!(user = %session.identity.email, "login successful");

    Ok(Json(LoginResponse {
        message: "Login successful",
        user: RequestIdentity::from_parts(&session.identity, &record),
        token: session.access_token,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: RegisteredUser,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if body.name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    if body.email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let identity = state
        .verifier
        .sign_up(&body.name, &body.email, &body.password)
        .await
        .map_err(|err| match err {
            VerifyError::Rejected(msg) => ApiError::BadRequest(msg),
            other => {
                tracing::error!(%other, "registration failed against identity provider");
                ApiError::Internal("Registration failed".to_string())
            }
        })?;

    // Best-effort: the auth gate's lazy-create covers a miss here
    let new_user = NewUserRecord {
        id: identity.id.clone(),
        name: body.name.clone(),
        email: identity.email.clone(),
        role: Role::User,
        verified: false,
    };
    if let Err(err) = state.directory.insert(&new_user).await {
        tracing::warn!(user_id = %identity.id, %err, "profile insert at registration failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful! Please check your email to verify your account.",
            user: RegisteredUser {
                id: identity.id,
                email: identity.email,
                name: body.name,
                role: Role::User,
            },
        }),
    ))
}
