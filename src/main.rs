use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use inkwell_api::config::AppConfig;
use inkwell_api::routes;
use inkwell_api::state::AppState;
use inkwell_api::supabase::gotrue::GoTrueClient;
use inkwell_api::supabase::rest::{RestClient, SupabaseDirectory, SupabasePosts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Missing Supabase credentials fail here, not on individual requests
    let config = AppConfig::from_env().context("invalid configuration")?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let verifier = GoTrueClient::new(
        http.clone(),
        config.supabase.url.clone(),
        config.supabase.anon_key.clone(),
    );
    let rest = RestClient::new(
        http,
        config.supabase.url.clone(),
        config.supabase.service_role_key.clone(),
    );

    let state = AppState {
        verifier: Arc::new(verifier),
        directory: Arc::new(SupabaseDirectory::new(rest.clone())),
        posts: Arc::new(SupabasePosts::new(rest)),
    };

    let app = routes::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Inkwell API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
