use anyhow::{bail, Context, Result};
use std::env;
use url::Url;

/// Process configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub server: ServerConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Base project URL, normalized to end with a slash.
    pub url: Url,
    /// Public key presented on identity-verifier calls.
    pub anon_key: String,
    /// Elevated key for directory writes that bypass row-level security.
    pub service_role_key: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Upper bound for every outbound Supabase call, in seconds.
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let raw_url = required("SUPABASE_URL")?;
        let mut url: Url = raw_url
            .parse()
            .with_context(|| format!("SUPABASE_URL is not a valid URL: {}", raw_url))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let port = match env::var("PORT") {
            Ok(v) => v.parse().with_context(|| format!("PORT is not a valid port: {}", v))?,
            Err(_) => 5000,
        };

        let timeout_secs = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("HTTP_TIMEOUT_SECS is not a number: {}", v))?,
            Err(_) => 10,
        };
        if timeout_secs == 0 {
            bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            supabase: SupabaseConfig {
                url,
                anon_key: required("SUPABASE_ANON_KEY")?,
                service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            },
            server: ServerConfig { port },
            http: HttpConfig { timeout_secs },
        })
    }
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} must be set", name))?;
    if value.trim().is_empty() {
        bail!("{} must not be empty", name);
    }
    Ok(value)
}
