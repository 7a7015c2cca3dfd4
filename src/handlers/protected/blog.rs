//! Admin-only blog writes. The author is always the authenticated identity.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::RequestIdentity;
use crate::models::{NewPost, Post};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl PostBody {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Title and content are required".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<PostBody>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    body.validate()?;

    let post = state
        .posts
        .create_post(&NewPost {
            title: body.title,
            content: body.content,
            user_id: identity.id,
        })
        .await?;

    tracing::info!(post_id = %post.id, author = %post.user_id, "blog post created");

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PostBody>,
) -> Result<Json<Post>, ApiError> {
    body.validate()?;

    let post = state
        .posts
        .update_post(id, &body.title, &body.content)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.posts.delete_post(id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}
