//! PostgREST client and the table-backed [`UserDirectory`] and
//! [`ContentStore`] implementations.
//!
//! Calls carry the service-role key so directory writes bypass row-level
//! security (the verified-flag sync and lazy profile creation must succeed
//! regardless of the requesting user's own row policies).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use super::{ContentStore, StoreError, UserDirectory};
use crate::models::{NewPost, NewUserRecord, Post, Role, UserRecord};

type Query<'a> = [(&'a str, String)];

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base: Url,
    service_key: String,
}

impl RestClient {
    /// `base` must end with a trailing slash (the config layer normalizes it).
    pub fn new(http: reqwest::Client, base: Url, service_key: String) -> Self {
        Self { http, base, service_key }
    }

    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.base
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict);
        }
        let detail = res.text().await.unwrap_or_default();
        Err(StoreError::Backend(format!("{}: {}", status, detail)))
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
    ) -> Result<Vec<T>, StoreError> {
        let res = self
            .request(reqwest::Method::GET, self.table_url(table)?)
            .query(query)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::check(res)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Range-limited select with an exact total, taken from `Content-Range`.
    pub async fn select_range<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
        start: u64,
        end: u64,
    ) -> Result<(Vec<T>, u64), StoreError> {
        let res = self
            .request(reqwest::Method::GET, self.table_url(table)?)
            .query(query)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", start, end))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let res = Self::check(res).await?;
        let total = content_range_total(&res)?;
        let rows = res
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok((rows, total))
    }

    pub async fn insert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let res = self
            .request(reqwest::Method::POST, self.table_url(table)?)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let rows: Vec<T> = Self::check(res)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("insert returned no representation".to_string()))
    }

    pub async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &Query<'_>,
        body: &B,
    ) -> Result<Vec<T>, StoreError> {
        let res = self
            .request(reqwest::Method::PATCH, self.table_url(table)?)
            .query(query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::check(res)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Returns the number of rows deleted.
    pub async fn delete(&self, table: &str, query: &Query<'_>) -> Result<u64, StoreError> {
        let res = self
            .request(reqwest::Method::DELETE, self.table_url(table)?)
            .query(query)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let rows: Vec<serde_json::Value> = Self::check(res)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(rows.len() as u64)
    }

    pub async fn count(&self, table: &str, query: &Query<'_>) -> Result<u64, StoreError> {
        let res = self
            .request(reqwest::Method::GET, self.table_url(table)?)
            .query(query)
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0")
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let res = Self::check(res).await?;
        content_range_total(&res)
    }
}

/// Parse the total out of a `Content-Range` header ("0-9/57" or "*/0").
fn content_range_total(res: &reqwest::Response) -> Result<u64, StoreError> {
    res.headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split('/').nth(1))
        .and_then(|total| total.parse().ok())
        .ok_or_else(|| StoreError::Backend("missing or unparsable Content-Range".to_string()))
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

#[derive(Clone)]
pub struct SupabaseDirectory {
    rest: RestClient,
}

impl SupabaseDirectory {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl UserDirectory for SupabaseDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let rows: Vec<UserRecord> = self
            .rest
            .select("users", &[("id", eq(id)), ("select", "*".to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, user: &NewUserRecord) -> Result<UserRecord, StoreError> {
        self.rest.insert("users", user).await
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<(), StoreError> {
        self.rest
            .update::<serde_json::Value, _>("users", &[("id", eq(id))], &json!({ "verified": verified }))
            .await
            .map(|_| ())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.rest
            .select(
                "users",
                &[
                    ("select", "*".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await
    }

    async fn update_profile(
        &self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let rows = self
            .rest
            .update("users", &[("id", eq(id))], &json!({ "name": name, "email": email }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<UserRecord>, StoreError> {
        let rows = self
            .rest
            .update("users", &[("id", eq(id))], &json!({ "role": role }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let deleted = self.rest.delete("users", &[("id", eq(id))]).await?;
        Ok(deleted > 0)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.rest.count("users", &[]).await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.rest
            .count("users", &[("created_at", format!("gte.{}", since.to_rfc3339()))])
            .await
    }
}

/// Column list with the author row embedded through the `user_id` relation.
const POST_SELECT: &str =
    "id,title,content,user_id,created_at,updated_at,author:users!user_id(id,name,role)";

#[derive(Clone)]
pub struct SupabasePosts {
    rest: RestClient,
}

impl SupabasePosts {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl ContentStore for SupabasePosts {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<(Vec<Post>, u64), StoreError> {
        let start = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let end = start + u64::from(limit) - 1;
        self.rest
            .select_range(
                "posts",
                &[
                    ("select", POST_SELECT.to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
                start,
                end,
            )
            .await
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        let rows: Vec<Post> = self
            .rest
            .select(
                "posts",
                &[("id", eq(&id.to_string())), ("select", POST_SELECT.to_string())],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        self.rest.insert("posts", post).await
    }

    async fn update_post(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, StoreError> {
        let rows = self
            .rest
            .update(
                "posts",
                &[("id", eq(&id.to_string()))],
                &json!({ "title": title, "content": content, "updated_at": Utc::now() }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        let deleted = self
            .rest
            .delete("posts", &[("id", eq(&id.to_string()))])
            .await?;
        Ok(deleted > 0)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.rest.count("posts", &[]).await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        self.rest
            .count("posts", &[("created_at", format!("gte.{}", since.to_rfc3339()))])
            .await
    }
}
