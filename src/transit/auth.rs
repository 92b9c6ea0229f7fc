use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::{Result, TransitError};

/// Source of bearer tokens for the transit API.
#[automock]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetches a fresh access token.
    async fn fetch_token(&self) -> Result<String>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OAuth2 client-credentials grant against the platform token endpoint.
pub struct ClientCredentials {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Creates a provider posting to `token_url` with the given credentials.
    pub fn new(client: Client, token_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            client,
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentials {
    async fn fetch_token(&self) -> Result<String> {
        tracing::debug!("Requesting access token from {}", self.token_url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let resp = self.client.post(&self.token_url).form(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransitError::TokenError(format!("token endpoint returned {status}")));
        }

        let body = resp.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(token.access_token)
    }
}

/// Bearer token plus the number of times it has been replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Credential {
    pub(crate) bearer: Option<String>,
    pub(crate) generation: u64,
}

/// The HTTP client and its bearer credential, shared by every tick and
/// command handler.
///
/// Refreshes are serialized: a caller that got a 401 with generation `g` only
/// fetches a new token if nobody replaced `g` in the meantime.
pub struct BearerSession {
    client: Client,
    provider: Arc<dyn TokenProvider>,
    credential: RwLock<Credential>,
    refresh_lock: Mutex<()>,
}

impl BearerSession {
    /// Creates a session with no token yet; call [`Self::authenticate`] first.
    pub fn new(client: Client, provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            provider,
            credential: RwLock::new(Credential::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Fetches the initial token. Callers treat a failure here as fatal.
    pub async fn authenticate(&self) -> Result<()> {
        let current = self.credential.read().await.generation;
        self.refresh(current).await?;
        tracing::info!("Authenticated against the transit API");
        Ok(())
    }

    pub(crate) async fn current(&self) -> Credential {
        self.credential.read().await.clone()
    }

    pub(crate) async fn refresh(&self, stale_generation: u64) -> Result<Credential> {
        let _guard = self.refresh_lock.lock().await;

        {
            let current = self.credential.read().await;
            if current.generation != stale_generation {
                tracing::debug!("Token already refreshed by another request");
                return Ok(current.clone());
            }
        }

        let bearer = self.provider.fetch_token().await?;
        let mut current = self.credential.write().await;
        current.bearer = Some(bearer);
        current.generation += 1;
        Ok(current.clone())
    }

    async fn send(&self, url: &Url, credential: &Credential) -> Result<Response> {
        let mut request = self.client.get(url.clone());
        if let Some(bearer) = &credential.bearer {
            request = request.bearer_auth(bearer);
        }
        Ok(request.send().await?)
    }

    /// GETs `url` and decodes the JSON body. A 401 triggers one refresh and
    /// one resend.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let credential = self.current().await;
        let mut resp = self.send(url, &credential).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("Transit API rejected the token, refreshing");
            let refreshed = self.refresh(credential.generation).await?;
            resp = self.send(url, &refreshed).await?;
        }

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransitError::Unauthorized);
        }
        if !status.is_success() {
            return Err(TransitError::UnexpectedStatus(status));
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
