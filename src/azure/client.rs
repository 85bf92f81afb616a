//! Azure Client
//!
//! Main client for one subscription's ARM requests, combining
//! authentication and HTTP functionality.

use super::auth::AzureCredentials;
use super::http::AzureHttpClient;
use crate::config::SubscriptionConfig;
use anyhow::Result;
use serde_json::Value;

/// Subscription-scoped Azure client
#[derive(Clone)]
pub struct AzureClient {
    pub credentials: AzureCredentials,
    pub http: AzureHttpClient,
    pub subscription_id: String,
    pub management_url: String,
}

impl AzureClient {
    /// Create a new Azure client for one configured subscription
    pub fn new(
        subscription: &SubscriptionConfig,
        management_url: &str,
        login_url: &str,
    ) -> Result<Self> {
        let http = AzureHttpClient::new()?;
        let credentials =
            AzureCredentials::new(http.clone(), subscription, login_url, management_url);

        Ok(Self {
            credentials,
            http,
            subscription_id: subscription.subscription_id.clone(),
            management_url: management_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make an authenticated GET request to an Azure API
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token, query).await
    }

    /// Build a subscription-scoped ARM URL
    pub fn subscription_url(&self, path: &str) -> String {
        format!(
            "{}/subscriptions/{}/{}",
            self.management_url, self.subscription_id, path
        )
    }

    /// Build a URL under an existing ARM resource id
    pub fn resource_url(&self, resource_id: &str, suffix: &str) -> String {
        format!("{}{}{}", self.management_url, resource_id, suffix)
    }
}
