//! Configuration Management
//!
//! Handles the JSON configuration file for azure-exporter.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Subscription key looked up when the scrape names no subscription or an
/// unknown one.
pub const DEFAULT_SUBSCRIPTION_KEY: &str = "default";

fn default_port() -> u16 {
    9276
}

/// 3 hours, matching the resolver cache default
fn default_cache_expiration_secs() -> u64 {
    3 * 60 * 60
}

fn default_management_url() -> String {
    "https://management.azure.com".to_string()
}

fn default_login_url() -> String {
    "https://login.microsoftonline.com".to_string()
}

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the /metrics listener binds to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Resolver cache TTL in seconds
    #[serde(default = "default_cache_expiration_secs")]
    pub cache_expiration_secs: u64,
    /// ARM endpoint, overridable for tests
    #[serde(default = "default_management_url")]
    pub management_url: String,
    /// AAD endpoint, overridable for tests
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Service-principal credentials keyed by subscription id or alias;
    /// a "default" entry is required
    pub subscriptions: HashMap<String, SubscriptionConfig>,
}

/// Service-principal credentials for one subscription
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.subscriptions.contains_key(DEFAULT_SUBSCRIPTION_KEY) {
            anyhow::bail!("config must define a \"{DEFAULT_SUBSCRIPTION_KEY}\" subscription");
        }
        Ok(())
    }

    /// Resolver cache TTL
    pub fn cache_expiration(&self) -> Duration {
        Duration::from_secs(self.cache_expiration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "subscriptions": {
            "default": {
                "tenant_id": "t",
                "client_id": "c",
                "client_secret": "s",
                "subscription_id": "sub-1"
            }
        }
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::from_json(MINIMAL).expect("config should parse");
        assert_eq!(config.port, 9276);
        assert_eq!(config.cache_expiration(), Duration::from_secs(10800));
        assert_eq!(config.management_url, "https://management.azure.com");
        assert_eq!(config.login_url, "https://login.microsoftonline.com");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_json(
            r#"{
                "port": 9999,
                "cache_expiration_secs": 60,
                "subscriptions": {
                    "default": {
                        "tenant_id": "t",
                        "client_id": "c",
                        "client_secret": "s",
                        "subscription_id": "sub-1"
                    }
                }
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.port, 9999);
        assert_eq!(config.cache_expiration(), Duration::from_secs(60));
    }

    #[test]
    fn missing_default_subscription_is_rejected() {
        let result = Config::from_json(
            r#"{
                "subscriptions": {
                    "prod": {
                        "tenant_id": "t",
                        "client_id": "c",
                        "client_secret": "s",
                        "subscription_id": "sub-1"
                    }
                }
            }"#,
        );
        assert!(result.is_err());
    }
}
