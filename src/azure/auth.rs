//! Azure Active Directory authentication
//!
//! Implements the client-credentials (service principal) flow against the
//! AAD token endpoint, with in-process token caching.

use super::http::AzureHttpClient;
use crate::config::SubscriptionConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if the token response carries no expiry
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(55 * 60);

/// AAD credentials holder with token caching
#[derive(Clone)]
pub struct AzureCredentials {
    http: AzureHttpClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    resource: String,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    /// Check if this cached token is still valid
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl AzureCredentials {
    /// Create credentials for one service principal
    pub fn new(
        http: AzureHttpClient,
        subscription: &SubscriptionConfig,
        login_url: &str,
        management_url: &str,
    ) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/{}/oauth2/token",
                login_url.trim_end_matches('/'),
                subscription.tenant_id
            ),
            client_id: subscription.client_id.clone(),
            client_secret: subscription.client_secret.clone(),
            // The token audience is the ARM endpoint with a trailing slash
            resource: format!("{}/", management_url.trim_end_matches('/')),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> Result<String> {
        // Check cache first - but only return if token is still valid
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let response = self
            .http
            .post_form(
                &self.token_url,
                &[
                    ("grant_type", "client_credentials"),
                    ("client_id", &self.client_id),
                    ("client_secret", &self.client_secret),
                    ("resource", &self.resource),
                ],
            )
            .await
            .context("Token request failed")?;

        let token = response
            .get("access_token")
            .and_then(|v| v.as_str())
            .context("Token response has no access_token")?
            .to_string();

        // AAD reports expires_in as a string of seconds; tolerate a number too
        let ttl = response
            .get("expires_in")
            .and_then(|v| {
                v.as_u64()
                    .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);

        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!("New token cached, expires in ~{} minutes", ttl.as_secs() / 60);

        Ok(token)
    }
}
