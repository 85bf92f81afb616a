//! Metric definition filter cache
//!
//! A resource's valid metric names are listed once and folded into a
//! `name.value eq '...' or ...` filter fragment cached for the process
//! lifetime. There is no invalidation path: a definition-set change on the
//! backend stays invisible until restart, a documented limitation.

use super::reader::ReadError;
use crate::azure::client::AzureClient;
use crate::azure::monitor;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-wide cache of filter fragments keyed by raw resource id
#[derive(Default)]
pub struct DefinitionCache {
    filters: RwLock<HashMap<String, String>>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached filter fragment for a resource, listing its metric
    /// definitions on first use. Zero definitions is a hard failure and is
    /// not cached, so the next scrape retries.
    pub async fn filter_for(
        &self,
        client: &AzureClient,
        resource_id: &str,
    ) -> Result<String, ReadError> {
        {
            let filters = self.filters.read().await;
            if let Some(filter) = filters.get(resource_id) {
                tracing::debug!(resource_id, "metric definition filter from cache");
                return Ok(filter.clone());
            }
        }

        let names = monitor::list_metric_definitions(client, resource_id)
            .await
            .map_err(ReadError::Backend)?;
        if names.is_empty() {
            return Err(ReadError::NoDefinitions(resource_id.to_string()));
        }

        let filter = names
            .iter()
            .map(|name| format!("name.value eq '{name}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        tracing::debug!(resource_id, definitions = names.len(), "cached metric definitions");

        let mut filters = self.filters.write().await;
        // A concurrent scrape may have won the race; keep the first insert
        let entry = filters.entry(resource_id.to_string()).or_insert(filter);
        Ok(entry.clone())
    }
}
