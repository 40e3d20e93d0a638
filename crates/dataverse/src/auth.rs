//! Bearer token sources.
//!
//! Token lifetime is owned by the [`Authenticator`]; the client only asks for
//! a token before each request and for one refresh after a `401`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{DataverseError, Result};

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Current bearer token.
    async fn token(&self) -> Result<String>;

    /// Discard the current token and obtain a new one.
    async fn refresh(&self) -> Result<String>;
}

/// Fixed token supplied by the caller, e.g. from an environment variable.
pub struct StaticTokenAuthenticator {
    token: String,
}

impl StaticTokenAuthenticator {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn from_env(var: &str) -> Result<Self> {
        let token = std::env::var(var)
            .map_err(|_| DataverseError::Auth(format!("{} not set", var)))?;
        if token.trim().is_empty() {
            return Err(DataverseError::Auth(format!("{} is empty", var)));
        }
        Ok(Self::new(token.trim()))
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> Result<String> {
        // Nothing to refresh; a rejected static token stays rejected.
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// Resource the token is for, normally the organization URL
    pub resource: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth2 client-credentials flow against the Microsoft identity platform.
///
/// The token is cached until [`Authenticator::refresh`] is called.
pub struct ClientCredentialsAuthenticator {
    client: Client,
    credentials: ClientCredentials,
    authority: String,
    timeout: Duration,
    cached: RwLock<Option<String>>,
}

impl ClientCredentialsAuthenticator {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
            authority: DEFAULT_AUTHORITY.to_string(),
            timeout: DEFAULT_TOKEN_TIMEOUT,
            cached: RwLock::new(None),
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Bound on each token request; clamped to at least one millisecond.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(Duration::from_millis(1));
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.credentials.tenant_id
        )
    }

    fn scope(&self) -> String {
        format!("{}/.default", self.credentials.resource.trim_end_matches('/'))
    }

    async fn acquire(&self) -> Result<String> {
        debug!(tenant = %self.credentials.tenant_id, "Requesting access token");

        let scope = self.scope();
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(self.token_url())
            .form(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DataverseError::Timeout {
                        operation: "token request".to_string(),
                    }
                } else {
                    DataverseError::Auth(format!("token request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DataverseError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DataverseError::Auth(format!("invalid token response: {}", e)))?;

        info!(expires_in = ?token.expires_in, "Access token acquired");
        Ok(token.access_token)
    }
}

#[async_trait]
impl Authenticator for ClientCredentialsAuthenticator {
    async fn token(&self) -> Result<String> {
        if let Some(token) = self.cached.read().await.as_ref() {
            return Ok(token.clone());
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String> {
        let mut cached = self.cached.write().await;
        let token = self.acquire().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}
