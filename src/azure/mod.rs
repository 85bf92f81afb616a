//! Azure REST API interaction module
//!
//! This module provides the core functionality for talking to Azure:
//! authentication, the HTTP client, typed ARM resource listing, and the
//! Azure Monitor metrics API.
//!
//! # Module Structure
//!
//! - [`auth`] - AAD client-credentials authentication with token caching
//! - [`client`] - subscription-scoped client for ARM requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`monitor`] - metric definitions and metric queries
//! - [`resources`] - per-kind ARM resource listers
//!
//! # Example
//!
//! ```ignore
//! use crate::azure::client::AzureClient;
//!
//! async fn example(client: &AzureClient) -> anyhow::Result<()> {
//!     let url = client.subscription_url("providers/Microsoft.Web/sites");
//!     let sites = client.get(&url, &[("api-version", "2022-03-01")]).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod monitor;
pub mod resources;
