//! Router assembly: every protected route wraps itself in the auth gate, and
//! admin routes compose the role gate after it.

use axum::handler::Handler;
use axum::routing::{delete, get, post, put};
use axum::{middleware, response::Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::protected::{admin, auth as protected_auth, blog, users};
use crate::handlers::public;
use crate::middleware::{auth_middleware, require_admin};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);
    let admin_only = middleware::from_fn(require_admin);

    // Admin surface: role gate runs inside the auth gate
    let admin_api = Router::new()
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/users", get(users::list_users))
        .route("/api/users/:id/role", put(users::update_role))
        .route("/api/users/:id", delete(users::delete_user))
        .route_layer(admin_only.clone())
        .route_layer(auth.clone());

    // Own-profile surface: any authenticated role
    let account_api = Router::new()
        .route("/api/users/me", get(users::me).put(users::update_me))
        .route("/api/auth/me", get(protected_auth::whoami))
        .route_layer(auth.clone());

    // Blog paths mix public reads and admin writes, so the write handlers
    // carry their gates individually
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/login", post(public::auth::login))
        .route("/api/auth/register", post(public::auth::register))
        .route(
            "/api/blog",
            get(public::blog::list_posts).post(
                blog::create_post
                    .layer(admin_only.clone())
                    .layer(auth.clone()),
            ),
        )
        .route(
            "/api/blog/:id",
            get(public::blog::get_post)
                .put(
                    blog::update_post
                        .layer(admin_only.clone())
                        .layer(auth.clone()),
                )
                .delete(blog::delete_post.layer(admin_only).layer(auth)),
        )
        .merge(admin_api)
        .merge(account_api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Inkwell API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/api/auth/login, /api/auth/register (public)",
            "blog": "/api/blog[/:id] (GET public, writes admin)",
            "users": "/api/users/me (authenticated), /api/users[/:id] (admin)",
            "admin": "/api/admin/stats (admin)",
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now() }))
}
