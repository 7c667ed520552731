use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::Credential;
use crate::types::{Result, SessionError};

/// The external auth collaborator: exchanges a current credential for a
/// renewed one. The session layer never issues tokens itself.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn renew(&self, current: &Credential) -> Result<Credential>;
}

/// Production provider: POSTs the refresh token to the auth service's
/// renewal endpoint.
pub struct HttpTokenProvider {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RenewalResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
}

impl HttpTokenProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn renew(&self, current: &Credential) -> Result<Credential> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or_else(|| SessionError::Auth("no refresh token available".to_string()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SessionError::Auth(format!(
                "token renewal rejected with status {}",
                response.status()
            )));
        }

        let body: RenewalResponse = response.json().await?;
        Ok(Credential::new(
            body.access_token,
            body.refresh_token
                .or_else(|| current.refresh_token.clone()),
            Duration::from_secs(body.expires_in),
        ))
    }
}

/// Provider that hands back the same token with a fixed lifetime on every
/// renewal. Useful for demos and for deployments where the socket credential
/// never rotates.
pub struct StaticTokenProvider {
    access_token: String,
    ttl: Duration,
}

impl StaticTokenProvider {
    pub fn new(access_token: impl Into<String>, ttl: Duration) -> Self {
        Self {
            access_token: access_token.into(),
            ttl,
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn renew(&self, current: &Credential) -> Result<Credential> {
        Ok(Credential::new(
            self.access_token.clone(),
            current.refresh_token.clone(),
            self.ttl,
        ))
    }
}
