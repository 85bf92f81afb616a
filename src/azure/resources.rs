//! ARM resource listing
//!
//! Per-kind listers over the ARM REST API, following `value`/`nextLink`
//! pagination to exhaustion. Records are parsed from JSON the plain way
//! rather than deserialized into full ARM shapes.

use super::client::AzureClient;
use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

const WEB_API_VERSION: &str = "2022-03-01";
const STORAGE_API_VERSION: &str = "2022-09-01";
const COMPUTE_API_VERSION: &str = "2023-03-01";
const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";
const SQL_API_VERSION: &str = "2021-11-01";

/// Minimal resource record: enough to match by name and resolve to an id
#[derive(Debug, Clone)]
pub struct ArmResource {
    pub name: String,
    pub id: String,
}

impl From<&Value> for ArmResource {
    fn from(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
            id: value
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("-")
                .to_string(),
        }
    }
}

/// App Service certificate record
#[derive(Debug, Clone)]
pub struct Certificate {
    pub name: String,
    pub id: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub issue_date: Option<DateTime<Utc>>,
    pub key_vault_id: Option<String>,
    pub key_vault_secret_status: Option<String>,
}

impl From<&Value> for Certificate {
    fn from(value: &Value) -> Self {
        let resource = ArmResource::from(value);
        Self {
            name: resource.name,
            id: resource.id,
            expiration_date: property_time(value, "expirationDate"),
            issue_date: property_time(value, "issueDate"),
            key_vault_id: property_str(value, "keyVaultId"),
            key_vault_secret_status: property_str(value, "keyVaultSecretStatus"),
        }
    }
}

fn property_str(value: &Value, key: &str) -> Option<String> {
    value
        .get("properties")
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// ARM timestamps usually carry an offset, but some are bare date-times
fn property_time(value: &Value, key: &str) -> Option<DateTime<Utc>> {
    let raw = value
        .get("properties")
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_str())?;
    parse_arm_time(raw)
}

fn parse_arm_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

/// Fetch all pages of a listing endpoint
async fn fetch_all(client: &AzureClient, url: String, api_version: &str) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    let mut response = client.get(&url, &[("api-version", api_version)]).await?;

    loop {
        if let Some(page) = response.get("value").and_then(|v| v.as_array()) {
            items.extend(page.iter().cloned());
        }

        // nextLink is an absolute URL carrying its own query parameters
        let Some(next) = response
            .get("nextLink")
            .and_then(|v| v.as_str())
            .map(String::from)
        else {
            break;
        };
        response = client.get(&next, &[]).await?;
    }

    Ok(items)
}

async fn list_as_resources(
    client: &AzureClient,
    url: String,
    api_version: &str,
) -> Result<Vec<ArmResource>> {
    let items = fetch_all(client, url, api_version).await?;
    Ok(items.iter().map(ArmResource::from).collect())
}

/// List all web apps in the subscription
pub async fn list_web_apps(client: &AzureClient) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url("providers/Microsoft.Web/sites");
    list_as_resources(client, url, WEB_API_VERSION).await
}

/// List all app service plans in the subscription
pub async fn list_app_service_plans(client: &AzureClient) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url("providers/Microsoft.Web/serverfarms");
    list_as_resources(client, url, WEB_API_VERSION).await
}

/// List all storage accounts in the subscription
pub async fn list_storage_accounts(client: &AzureClient) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url("providers/Microsoft.Storage/storageAccounts");
    list_as_resources(client, url, STORAGE_API_VERSION).await
}

/// List all virtual machines in the subscription
pub async fn list_virtual_machines(client: &AzureClient) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url("providers/Microsoft.Compute/virtualMachines");
    list_as_resources(client, url, COMPUTE_API_VERSION).await
}

/// List all resource groups in the subscription
pub async fn list_resource_groups(client: &AzureClient) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url("resourcegroups");
    list_as_resources(client, url, RESOURCE_GROUP_API_VERSION).await
}

/// List the certificates of one resource group
pub async fn list_certificates(
    client: &AzureClient,
    resource_group: &str,
) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url(&format!(
        "resourceGroups/{resource_group}/providers/Microsoft.Web/certificates"
    ));
    list_as_resources(client, url, WEB_API_VERSION).await
}

/// Fetch one certificate by its resource id
pub async fn get_certificate(client: &AzureClient, resource_id: &str) -> Result<Certificate> {
    let url = client.resource_url(resource_id, "");
    let response = client
        .get(&url, &[("api-version", WEB_API_VERSION)])
        .await?;
    Ok(Certificate::from(&response))
}

/// List all SQL servers in the subscription
pub async fn list_sql_servers(client: &AzureClient) -> Result<Vec<ArmResource>> {
    let url = client.subscription_url("providers/Microsoft.Sql/servers");
    list_as_resources(client, url, SQL_API_VERSION).await
}

/// List the databases of one SQL server
pub async fn list_sql_databases(
    client: &AzureClient,
    server_id: &str,
) -> Result<Vec<ArmResource>> {
    let url = client.resource_url(server_id, "/databases");
    list_as_resources(client, url, SQL_API_VERSION).await
}
