#![allow(dead_code)]

//! In-memory fakes for the three Supabase seams, plus request helpers that
//! drive the router in-process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use inkwell_api::models::{NewPost, NewUserRecord, Post, Role, UserRecord};
use inkwell_api::routes;
use inkwell_api::state::AppState;
use inkwell_api::supabase::{
    ContentStore, IdentityVerifier, Session, StoreError, UserDirectory, VerifiedIdentity,
    VerifyError,
};

pub fn identity(id: &str, email: &str, confirmed: bool, name: Option<&str>) -> VerifiedIdentity {
    VerifiedIdentity {
        id: id.to_string(),
        email: email.to_string(),
        email_confirmed: confirmed,
        name: name.map(str::to_string),
    }
}

pub fn user_record(id: &str, name: &str, email: &str, role: Role, verified: bool) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        role,
        verified,
        created_at: Some(Utc::now()),
    }
}

#[derive(Default)]
pub struct FakeVerifier {
    tokens: Mutex<HashMap<String, Result<VerifiedIdentity, VerifyError>>>,
    /// email -> (password, issued token)
    logins: Mutex<HashMap<String, (String, String)>>,
    pub calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn grant(&self, token: &str, identity: VerifiedIdentity) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), Ok(identity));
    }

    pub fn deny(&self, token: &str, err: VerifyError) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), Err(err));
    }

    /// Register a password login that issues `token` (which must also be
    /// granted for subsequent bearer use).
    pub fn allow_login(&self, email: &str, password: &str, token: &str, who: VerifiedIdentity) {
        self.logins.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), token.to_string()),
        );
        self.grant(token, who);
    }

    pub fn verify_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.tokens.lock().unwrap().get(token) {
            Some(result) => result.clone(),
            None => Err(VerifyError::Rejected("User not found".to_string())),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, VerifyError> {
        let logins = self.logins.lock().unwrap();
        match logins.get(email) {
            Some((expected, token)) if expected == password => {
                let identity = self.tokens.lock().unwrap()[token].clone()?;
                Ok(Session {
                    identity,
                    access_token: token.clone(),
                })
            }
            _ => Err(VerifyError::Rejected("Invalid login credentials".to_string())),
        }
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        _password: &str,
    ) -> Result<VerifiedIdentity, VerifyError> {
        Ok(identity(&format!("id-{}", email), email, false, Some(name)))
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    rows: Mutex<HashMap<String, UserRecord>>,
    pub inserts: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_inserts: AtomicBool,
    pub fail_sync: AtomicBool,
    /// One-shot: the next insert loses a creation race (the row appears, but
    /// the insert itself reports a conflict).
    pub conflict_next_insert: AtomicBool,
}

impl FakeDirectory {
    pub fn seed(&self, record: UserRecord) {
        self.rows.lock().unwrap().insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<UserRecord> {
        self.rows.lock().unwrap().get(id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }
}

fn from_new(user: &NewUserRecord) -> UserRecord {
    UserRecord {
        id: user.id.clone(),
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
        verified: user.verified,
        created_at: Some(Utc::now()),
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected read failure".to_string()));
        }
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn insert(&self, user: &NewUserRecord) -> Result<UserRecord, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected insert failure".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if self.conflict_next_insert.swap(false, Ordering::SeqCst) {
            rows.entry(user.id.clone()).or_insert_with(|| from_new(user));
            return Err(StoreError::Conflict);
        }
        if rows.contains_key(&user.id) {
            return Err(StoreError::Conflict);
        }
        let record = from_new(user);
        rows.insert(user.id.clone(), record.clone());
        Ok(record)
    }

    async fn set_verified(&self, id: &str, verified: bool) -> Result<(), StoreError> {
        if self.fail_sync.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected sync failure".to_string()));
        }
        if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
            row.verified = verified;
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_profile(
        &self,
        id: &str,
        name: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(id).map(|row| {
            row.name = name.to_string();
            row.email = email.to_string();
            row.clone()
        }))
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Option<UserRecord>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.get_mut(id).map(|row| {
            row.role = role;
            row.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.rows.lock().unwrap().remove(id).is_some())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| row.created_at.map(|at| at >= since).unwrap_or(false))
            .count() as u64)
    }
}

#[derive(Default)]
pub struct FakePosts {
    rows: Mutex<Vec<Post>>,
    pub fail: AtomicBool,
}

impl FakePosts {
    pub fn seed(&self, post: Post) {
        self.rows.lock().unwrap().push(post);
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

pub fn post(title: &str, content: &str, user_id: &str) -> Post {
    Post {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: content.to_string(),
        user_id: user_id.to_string(),
        created_at: Utc::now(),
        updated_at: None,
        author: None,
    }
}

#[async_trait]
impl ContentStore for FakePosts {
    async fn list_posts(&self, page: u32, limit: u32) -> Result<(Vec<Post>, u64), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        let mut posts = self.rows.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = posts.len() as u64;
        let start = ((page - 1) * limit) as usize;
        let window = posts
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();
        Ok((window, total))
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn create_post(&self, new: &NewPost) -> Result<Post, StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        let created = Post {
            id: Uuid::new_v4(),
            title: new.title.clone(),
            content: new.content.clone(),
            user_id: new.user_id.clone(),
            created_at: Utc::now(),
            updated_at: None,
            author: None,
        };
        self.rows.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_post(
        &self,
        id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<Post>, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|p| p.id == id).map(|p| {
            p.title = title.to_string();
            p.content = content.to_string();
            p.updated_at = Some(Utc::now());
            p.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() < before)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.created_at >= since)
            .count() as u64)
    }
}

pub struct TestApp {
    pub app: Router,
    pub verifier: Arc<FakeVerifier>,
    pub directory: Arc<FakeDirectory>,
    pub posts: Arc<FakePosts>,
}

pub fn test_app() -> TestApp {
    let verifier = Arc::new(FakeVerifier::default());
    let directory = Arc::new(FakeDirectory::default());
    let posts = Arc::new(FakePosts::default());
    let app = routes::app(AppState {
        verifier: verifier.clone(),
        directory: directory.clone(),
        posts: posts.clone(),
    });
    TestApp {
        app,
        verifier,
        directory,
        posts,
    }
}

/// App pre-seeded with an admin ("admin-token" / id "admin1") and a regular
/// user ("user-token" / id "user1").
pub fn seeded_app() -> TestApp {
    let t = test_app();
    t.verifier
        .grant("admin-token", identity("admin1", "admin@x.com", true, Some("Admin")));
    t.directory
        .seed(user_record("admin1", "Admin", "admin@x.com", Role::Admin, true));
    t.verifier
        .grant("user-token", identity("user1", "user@x.com", true, Some("Regular")));
    t.directory
        .seed(user_record("user1", "Regular", "user@x.com", Role::User, true));
    t
}

pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn get(app: &Router, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, "GET", path, token, None).await
}
