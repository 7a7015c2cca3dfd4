//! Admin dashboard statistics.

use axum::{extract::State, response::Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    pub total_posts: u64,
    pub new_users_this_week: u64,
    pub new_posts_this_week: u64,
    pub last_updated: DateTime<Utc>,
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let last_week = Utc::now() - Duration::days(7);

    let total_users = state.directory.count().await?;
    let total_posts = state.posts.count().await?;
    let new_users_this_week = state.directory.count_since(last_week).await?;
    let new_posts_this_week = state.posts.count_since(last_week).await?;

    Ok(Json(StatsResponse {
        total_users,
        total_posts,
        new_users_this_week,
        new_posts_this_week,
        last_updated: Utc::now(),
    }))
}
