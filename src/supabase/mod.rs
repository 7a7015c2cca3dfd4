//! Seams to the Supabase backend: identity verification (GoTrue) and
//! table access (PostgREST).
//!
//! The traits keep the gates and handlers independent of the wire clients;
//! production wires in [`gotrue::GoTrueClient`] and the [`rest`] clients,
//! tests wire in in-memory fakes.

pub mod gotrue;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{NewPost, NewUserRecord, Post, Role, UserRecord};

/// Identity record returned by the verifier on a successful check.
/// Read-only from this system's perspective.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub id: String,
    pub email: String,
    pub email_confirmed: bool,
    /// Display name from identity metadata, when the provider has one.
    pub name: Option<String>,
}

/// Result of a password sign-in: the identity plus the bearer token the
/// client presents on subsequent requests.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: VerifiedIdentity,
    pub access_token: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VerifyError {
    /// The session behind the credential is missing or expired; clients are
    /// told to log in again.
    #[error("auth session expired")]
    SessionExpired,
    /// The verifier rejected the credential for any other reason.
    #[error("credential rejected: {0}")]
    Rejected(String),
    /// The verifier could not be reached or timed out. Callers fail closed.
    #[error("identity verifier unreachable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness violation on insert, e.g. two first-requests racing on
    /// lazy profile creation.
    #[error("row conflict")]
    Conflict,
    /// Transport failure, timeout, or any non-conflict backend rejection.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Exchanges bearer credentials for verified identities.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, VerifyError>;

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, VerifyError>;
}

/// The application's `users` table. "No rows" is `Ok(None)` on reads, never
/// an error; errors mean the backend itself failed.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, user: &NewUserRecord) -> Result<UserRecord, StoreError>;

    async fn set_verified(&self, id: &str, verified: bool) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn update_profile(
        &self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<UserRecord>, StoreError>;

    /// Returns whether a row was actually deleted.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// The `posts` table.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Returns one page of posts (newest first) plus the total row count.
    async fn list_posts(&self, page: u32, limit: u32) -> Result<(Vec<Post>, u64), StoreError>;

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError>;

    async fn update_post(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, StoreError>;

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError>;
}
