//! Resource resolution
//!
//! Maps a user-supplied `(resource_type, resource_name)` pair to a parsed
//! [`ResourceId`], backed by a TTL cache so repeated scrapes of the same
//! target do not re-list resources on every request.

use super::resource_id::ResourceId;
use crate::azure::client::AzureClient;
use crate::azure::resources::{self, ArmResource};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Resolution failure; everything but `Backend` means "no such resource"
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unsupported resource type {0:?}")]
    UnsupportedType(String),
    #[error("no {resource_type} named {name:?}")]
    NotFound { resource_type: String, name: String },
    #[error("resource name {0:?} matches more than one resource")]
    Ambiguous(String),
    #[error("{0:?} is not a valid server/database name")]
    MalformedName(String),
    #[error("resource listing failed")]
    Backend(#[source] anyhow::Error),
}

struct CachedId {
    id: ResourceId,
    expires_at: Instant,
}

/// TTL cache of resolved ids, keyed by lowercased type and exact name.
/// Expiry is measured from insertion; reads never refresh it.
pub struct ResolverCache {
    ttl: Duration,
    entries: RwLock<HashMap<(String, String), CachedId>>,
}

impl ResolverCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, resource_type: &str, name: &str) -> Option<ResourceId> {
        self.get_at(resource_type, name, Instant::now()).await
    }

    pub async fn get_at(
        &self,
        resource_type: &str,
        name: &str,
        now: Instant,
    ) -> Option<ResourceId> {
        let entries = self.entries.read().await;
        entries
            .get(&(resource_type.to_string(), name.to_string()))
            .filter(|cached| now < cached.expires_at)
            .map(|cached| cached.id.clone())
    }

    pub async fn insert(&self, resource_type: &str, name: &str, id: ResourceId) {
        self.insert_at(resource_type, name, id, Instant::now()).await
    }

    pub async fn insert_at(&self, resource_type: &str, name: &str, id: ResourceId, now: Instant) {
        let mut entries = self.entries.write().await;
        entries.insert(
            (resource_type.to_string(), name.to_string()),
            CachedId {
                id,
                expires_at: now + self.ttl,
            },
        );
    }
}

/// Resolves `(resource_type, resource_name)` pairs against ARM
pub struct ResourceResolver {
    cache: ResolverCache,
}

impl ResourceResolver {
    pub fn new(cache_ttl: Duration) -> Self {
        Self {
            cache: ResolverCache::new(cache_ttl),
        }
    }

    /// Resolve a type/name pair to a resource id. Live cache entries are
    /// returned verbatim without touching the backend; failures are never
    /// cached, so the next scrape retries.
    pub async fn resolve(
        &self,
        client: &AzureClient,
        resource_type: &str,
        resource_name: &str,
    ) -> Result<ResourceId, ResolveError> {
        let type_key = resource_type.to_ascii_lowercase();

        if let Some(id) = self.cache.get(&type_key, resource_name).await {
            tracing::debug!(resource_type, resource_name, "resolver cache hit");
            return Ok(id);
        }

        let found = self.lookup(client, &type_key, resource_name).await?;
        let id = ResourceId::parse(&found.id).map_err(|e| ResolveError::Backend(e.into()))?;

        self.cache.insert(&type_key, resource_name, id.clone()).await;
        tracing::info!(resource_type, resource_name, id = id.raw(), "resolved resource");

        Ok(id)
    }

    async fn lookup(
        &self,
        client: &AzureClient,
        type_key: &str,
        name: &str,
    ) -> Result<ArmResource, ResolveError> {
        match type_key {
            "webapp" => {
                let apps = resources::list_web_apps(client)
                    .await
                    .map_err(ResolveError::Backend)?;
                single_match(apps, type_key, name)
            }
            "appserviceplan" => {
                let plans = resources::list_app_service_plans(client)
                    .await
                    .map_err(ResolveError::Backend)?;
                single_match(plans, type_key, name)
            }
            "storageaccount" => {
                let accounts = resources::list_storage_accounts(client)
                    .await
                    .map_err(ResolveError::Backend)?;
                single_match(accounts, type_key, name)
            }
            "vm" => {
                let machines = resources::list_virtual_machines(client)
                    .await
                    .map_err(ResolveError::Backend)?;
                single_match(machines, type_key, name)
            }
            "certificate" => self.lookup_certificate(client, name).await,
            "sqldatabase" => self.lookup_sql_database(client, name).await,
            other => Err(ResolveError::UnsupportedType(other.to_string())),
        }
    }

    /// Certificates are listed per resource group; the first group holding
    /// exactly one match wins. Names are not globally unique across groups.
    async fn lookup_certificate(
        &self,
        client: &AzureClient,
        name: &str,
    ) -> Result<ArmResource, ResolveError> {
        let groups = resources::list_resource_groups(client)
            .await
            .map_err(ResolveError::Backend)?;

        for group in &groups {
            let certificates = resources::list_certificates(client, &group.name)
                .await
                .map_err(ResolveError::Backend)?;
            let mut matches: Vec<ArmResource> = certificates
                .into_iter()
                .filter(|c| c.name == name)
                .collect();
            match matches.len() {
                0 => continue,
                1 => return Ok(matches.remove(0)),
                _ => return Err(ResolveError::Ambiguous(name.to_string())),
            }
        }

        Err(ResolveError::NotFound {
            resource_type: "certificate".to_string(),
            name: name.to_string(),
        })
    }

    /// SQL databases are named `server/database`
    async fn lookup_sql_database(
        &self,
        client: &AzureClient,
        name: &str,
    ) -> Result<ArmResource, ResolveError> {
        let parts: Vec<&str> = name.split('/').collect();
        let [server_name, database_name] = parts.as_slice() else {
            return Err(ResolveError::MalformedName(name.to_string()));
        };

        let servers = resources::list_sql_servers(client)
            .await
            .map_err(ResolveError::Backend)?;
        let server = single_match(servers, "sqlserver", server_name)?;

        let databases = resources::list_sql_databases(client, &server.id)
            .await
            .map_err(ResolveError::Backend)?;
        single_match(databases, "sqldatabase", database_name)
    }
}

/// Require exactly one case-sensitive name match; several is an error, not
/// an arbitrary pick
fn single_match(
    items: Vec<ArmResource>,
    resource_type: &str,
    name: &str,
) -> Result<ArmResource, ResolveError> {
    let mut matches: Vec<ArmResource> = items.into_iter().filter(|r| r.name == name).collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Err(ResolveError::NotFound {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        }),
        _ => Err(ResolveError::Ambiguous(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubscriptionConfig;

    fn dummy_client() -> AzureClient {
        let subscription = SubscriptionConfig {
            tenant_id: "t".to_string(),
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            subscription_id: "sub".to_string(),
        };
        AzureClient::new(&subscription, "http://localhost:1", "http://localhost:1")
            .expect("client should build")
    }

    fn sample_id() -> ResourceId {
        ResourceId::parse("/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/sites/app")
            .expect("should parse")
    }

    #[test]
    fn cache_entry_expires_after_ttl() {
        tokio_test::block_on(async {
            let cache = ResolverCache::new(Duration::from_secs(10));
            let id = sample_id();
            let t0 = Instant::now();

            cache.insert_at("webapp", "app", id.clone(), t0).await;
            assert_eq!(
                cache.get_at("webapp", "app", t0 + Duration::from_secs(9)).await,
                Some(id)
            );
            assert_eq!(
                cache.get_at("webapp", "app", t0 + Duration::from_secs(11)).await,
                None
            );
        });
    }

    #[test]
    fn reads_do_not_refresh_expiry() {
        tokio_test::block_on(async {
            let cache = ResolverCache::new(Duration::from_secs(10));
            let t0 = Instant::now();
            cache.insert_at("webapp", "app", sample_id(), t0).await;

            // A read just before expiry must not extend the entry's life
            assert!(cache
                .get_at("webapp", "app", t0 + Duration::from_secs(9))
                .await
                .is_some());
            assert!(cache
                .get_at("webapp", "app", t0 + Duration::from_secs(11))
                .await
                .is_none());
        });
    }

    #[test]
    fn unsupported_type_fails_without_backend_calls() {
        tokio_test::block_on(async {
            let resolver = ResourceResolver::new(Duration::from_secs(10));
            // The dummy client points at a closed port; an attempted listing
            // would error differently than UnsupportedType
            let result = resolver
                .resolve(&dummy_client(), "loadbalancer", "lb-1")
                .await;
            assert!(matches!(result, Err(ResolveError::UnsupportedType(_))));
        });
    }

    #[test]
    fn malformed_sql_name_is_rejected_before_lookup() {
        tokio_test::block_on(async {
            let resolver = ResourceResolver::new(Duration::from_secs(10));
            for name in ["justaserver", "a/b/c", ""] {
                let result = resolver.resolve(&dummy_client(), "sqldatabase", name).await;
                assert!(
                    matches!(result, Err(ResolveError::MalformedName(_))),
                    "{name:?} should be malformed"
                );
            }
        });
    }
}
