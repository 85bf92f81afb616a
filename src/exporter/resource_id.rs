//! ARM resource id parsing
//!
//! A resource id is parsed structurally exactly once, yielding the resource
//! kind, the resource group, and (for SQL databases) the server/database
//! segments. All later branching switches on the parsed kind.

use thiserror::Error;

/// A resource id that does not follow the
/// `.../resourceGroups/{group}/providers/...` shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0:?} is not a valid resource id")]
pub struct InvalidResourceId(pub String);

/// Closed set of resource kinds the exporter knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    WebApp,
    AppServicePlan,
    SqlDatabase,
    VirtualMachine,
    StorageAccount,
    ApiManagement,
    Certificate,
    Unknown,
}

impl ResourceKind {
    /// Metric name prefix for this kind; unrecognized kinds fall back to
    /// a generic prefix rather than failing
    pub fn prefix(self) -> &'static str {
        match self {
            ResourceKind::WebApp => "webapp",
            ResourceKind::AppServicePlan => "appplan",
            ResourceKind::SqlDatabase => "database",
            ResourceKind::VirtualMachine => "vm",
            ResourceKind::StorageAccount => "storage",
            ResourceKind::ApiManagement => "apim",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Unknown => "azure",
        }
    }
}

/// Server and database segments of a SQL database id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlPath {
    pub server: String,
    pub database: String,
}

/// A parsed ARM resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    raw: String,
    resource_group: String,
    kind: ResourceKind,
    sql: Option<SqlPath>,
}

impl ResourceId {
    /// Parse a raw ARM resource id string
    pub fn parse(raw: &str) -> Result<Self, InvalidResourceId> {
        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();

        let invalid = || InvalidResourceId(raw.to_string());

        let group_pos = segments
            .iter()
            .position(|s| s.eq_ignore_ascii_case("resourcegroups"))
            .ok_or_else(invalid)?;
        let resource_group = segments.get(group_pos + 1).ok_or_else(invalid)?.to_string();

        let provider_pos = segments
            .iter()
            .enumerate()
            .skip(group_pos + 2)
            .find(|(_, s)| s.eq_ignore_ascii_case("providers"))
            .map(|(i, _)| i)
            .ok_or_else(invalid)?;
        let provider = segments.get(provider_pos + 1).ok_or_else(invalid)?;
        let rest = &segments[provider_pos + 2..];

        let (kind, sql) = detect_kind(provider, rest);

        Ok(Self {
            raw: raw.to_string(),
            resource_group,
            kind,
            sql,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn resource_group(&self) -> &str {
        &self.resource_group
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn sql(&self) -> Option<&SqlPath> {
        self.sql.as_ref()
    }
}

fn detect_kind(provider: &str, rest: &[&str]) -> (ResourceKind, Option<SqlPath>) {
    let first_type = rest.first().copied().unwrap_or("");

    if provider.eq_ignore_ascii_case("Microsoft.Web") {
        let kind = if first_type.eq_ignore_ascii_case("sites") {
            ResourceKind::WebApp
        } else if first_type.eq_ignore_ascii_case("serverfarms") {
            ResourceKind::AppServicePlan
        } else if first_type.eq_ignore_ascii_case("certificates") {
            ResourceKind::Certificate
        } else {
            ResourceKind::Unknown
        };
        return (kind, None);
    }

    if provider.eq_ignore_ascii_case("Microsoft.Sql") {
        if let Some(sql) = parse_sql_path(rest) {
            return (ResourceKind::SqlDatabase, Some(sql));
        }
        return (ResourceKind::Unknown, None);
    }

    if provider.eq_ignore_ascii_case("Microsoft.Compute")
        && first_type.eq_ignore_ascii_case("virtualMachines")
    {
        return (ResourceKind::VirtualMachine, None);
    }

    let provider_lower = provider.to_ascii_lowercase();
    if provider_lower.starts_with("microsoft.storage") {
        return (ResourceKind::StorageAccount, None);
    }
    if provider_lower.contains("apimanagement") {
        return (ResourceKind::ApiManagement, None);
    }

    (ResourceKind::Unknown, None)
}

/// Expects `servers/{server}/databases/{database}` within the type segments
fn parse_sql_path(rest: &[&str]) -> Option<SqlPath> {
    if !rest.first()?.eq_ignore_ascii_case("servers") {
        return None;
    }
    let server = rest.get(1)?;
    let db_pos = rest
        .iter()
        .position(|s| s.eq_ignore_ascii_case("databases"))?;
    let database = rest.get(db_pos + 1)?;
    Some(SqlPath {
        server: server.to_string(),
        database: database.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_webapp_id() {
        let id = ResourceId::parse(
            "/subscriptions/s/resourceGroups/prod/providers/Microsoft.Web/sites/frontend",
        )
        .expect("should parse");
        assert_eq!(id.kind(), ResourceKind::WebApp);
        assert_eq!(id.resource_group(), "prod");
        assert_eq!(id.kind().prefix(), "webapp");
        assert!(id.sql().is_none());
    }

    #[test]
    fn parses_sql_database_segments() {
        let id = ResourceId::parse(
            "/subscriptions/s/resourceGroups/data/providers/Microsoft.Sql/servers/myserver/databases/mydb",
        )
        .expect("should parse");
        assert_eq!(id.kind(), ResourceKind::SqlDatabase);
        assert_eq!(
            id.sql(),
            Some(&SqlPath {
                server: "myserver".to_string(),
                database: "mydb".to_string(),
            })
        );
    }

    #[test]
    fn sql_server_without_database_is_unknown() {
        let id = ResourceId::parse(
            "/subscriptions/s/resourceGroups/data/providers/Microsoft.Sql/servers/myserver",
        )
        .expect("should parse");
        assert_eq!(id.kind(), ResourceKind::Unknown);
        assert_eq!(id.kind().prefix(), "azure");
    }

    #[test]
    fn segment_matching_is_case_insensitive() {
        let id = ResourceId::parse(
            "/subscriptions/s/resourcegroups/rg/providers/microsoft.storage/storageAccounts/acct",
        )
        .expect("should parse");
        assert_eq!(id.kind(), ResourceKind::StorageAccount);
        assert_eq!(id.resource_group(), "rg");
    }

    #[test]
    fn detects_remaining_kinds() {
        let cases = [
            (
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/serverfarms/plan",
                ResourceKind::AppServicePlan,
            ),
            (
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Web/certificates/cert",
                ResourceKind::Certificate,
            ),
            (
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1",
                ResourceKind::VirtualMachine,
            ),
            (
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ApiManagement/service/gw",
                ResourceKind::ApiManagement,
            ),
            (
                "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/loadBalancers/lb",
                ResourceKind::Unknown,
            ),
        ];
        for (raw, kind) in cases {
            assert_eq!(ResourceId::parse(raw).expect("should parse").kind(), kind);
        }
    }

    #[test]
    fn rejects_ids_without_group_or_provider() {
        assert!(ResourceId::parse("/subscriptions/s/providers/Microsoft.Web/sites/x").is_err());
        assert!(ResourceId::parse("/subscriptions/s/resourceGroups/rg").is_err());
        assert!(ResourceId::parse("not-an-id").is_err());
    }
}
