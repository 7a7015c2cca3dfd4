//! GoTrue client: the production [`IdentityVerifier`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{IdentityVerifier, Session, VerifiedIdentity, VerifyError};

pub struct GoTrueClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl GoTrueClient {
    /// `base` must end with a trailing slash (the config layer normalizes it).
    pub fn new(http: reqwest::Client, base: Url, anon_key: String) -> Self {
        Self { http, base, anon_key }
    }

    fn endpoint(&self, path: &str) -> Result<Url, VerifyError> {
        self.base
            .join(path)
            .map_err(|e| VerifyError::Transport(e.to_string()))
    }
}

/// User payload as GoTrue returns it.
#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<GoTrueUser> for VerifiedIdentity {
    fn from(user: GoTrueUser) -> Self {
        let name = user
            .user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        VerifiedIdentity {
            id: user.id,
            email: user.email.unwrap_or_default(),
            email_confirmed: user.email_confirmed_at.is_some(),
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: GoTrueUser,
}

/// Classify a verifier rejection from its error message. GoTrue phrases
/// missing/expired sessions as e.g. "Auth session missing" or
/// "token is expired"; everything else is a generic rejection.
pub fn classify_rejection(message: &str) -> VerifyError {
    let m = message.to_ascii_lowercase();
    if m.contains("session") || m.contains("expired") {
        VerifyError::SessionExpired
    } else {
        VerifyError::Rejected(message.to_string())
    }
}

/// Pull the human-readable message out of a GoTrue error body. The field
/// name varies across endpoints.
async fn rejection_message(res: reqwest::Response) -> String {
    let status = res.status();
    match res.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("msg")
            .or_else(|| body.get("message"))
            .or_else(|| body.get("error_description"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("verifier returned {}", status)),
        Err(_) => format!("verifier returned {}", status),
    }
}

#[async_trait]
impl IdentityVerifier for GoTrueClient {
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let url = self.endpoint("auth/v1/user")?;
        let res = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        if res.status().is_success() {
            let user: GoTrueUser = res
                .json()
                .await
                .map_err(|e| VerifyError::Transport(e.to_string()))?;
            Ok(user.into())
        } else {
            Err(classify_rejection(&rejection_message(res).await))
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, VerifyError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.set_query(Some("grant_type=password"));
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        if res.status().is_success() {
            let token: TokenResponse = res
                .json()
                .await
                .map_err(|e| VerifyError::Transport(e.to_string()))?;
            Ok(Session {
                identity: token.user.into(),
                access_token: token.access_token,
            })
        } else {
            // Sign-in rejections are never session expiry
            Err(VerifyError::Rejected(rejection_message(res).await))
        }
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, VerifyError> {
        let url = self.endpoint("auth/v1/signup")?;
        let res = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await
            .map_err(|e| VerifyError::Transport(e.to_string()))?;

        if res.status().is_success() {
            let user: GoTrueUser = res
                .json()
                .await
                .map_err(|e| VerifyError::Transport(e.to_string()))?;
            Ok(user.into())
        } else {
            Err(VerifyError::Rejected(rejection_message(res).await))
        }
    }
}
