//! Metric translation
//!
//! Turns a resolved resource id into a set of exposition gauges. Certificate
//! resources are computed from their own metadata with no Monitor query;
//! every other kind gets a one-minute-window Monitor query whose series are
//! normalized into four gauges each (total/average/minimum/maximum).

use super::definitions::DefinitionCache;
use super::naming;
use super::resource_id::{ResourceId, ResourceKind};
use super::ExposedGauge;
use crate::azure::client::AzureClient;
use crate::azure::monitor::{self, MetricPoint};
use crate::azure::resources;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure while reading metrics for one scrape
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("no metric definitions found for {0}")]
    NoDefinitions(String),
    #[error("monitoring backend request failed")]
    Backend(#[source] anyhow::Error),
}

/// The translator; owns the process-wide definition cache
#[derive(Default)]
pub struct MetricReader {
    definitions: DefinitionCache,
}

impl MetricReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all metrics for one resource. A backend failure aborts the whole
    /// translation; there are no partial results.
    pub async fn read_metrics(
        &self,
        client: &AzureClient,
        id: &ResourceId,
    ) -> Result<Vec<ExposedGauge>, ReadError> {
        self.read_metrics_at(client, id, Utc::now()).await
    }

    /// Like [`read_metrics`](Self::read_metrics) with an explicit clock, so
    /// tests control the query window and certificate day arithmetic.
    pub async fn read_metrics_at(
        &self,
        client: &AzureClient,
        id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExposedGauge>, ReadError> {
        if id.kind() == ResourceKind::Certificate {
            return self.certificate_gauges(client, id, now).await;
        }

        let definition_filter = self.definitions.filter_for(client, id.raw()).await?;

        // Query the last complete minute; the current minute may still be
        // filling in and is deliberately excluded
        let end = now - chrono::Duration::minutes(1);
        let start = end - chrono::Duration::minutes(1);
        let filter = build_filter(&definition_filter, start, end);

        let series = monitor::query_metrics(client, id.raw(), &filter)
            .await
            .map_err(ReadError::Backend)?;

        let base_labels = base_labels(id);
        let prefix = id.kind().prefix();
        let mut gauges = Vec::new();

        for s in &series {
            let Some(point) = s.data.last() else {
                tracing::debug!(metric = %s.name, "series has no data points, skipping");
                continue;
            };

            let mut labels = base_labels.clone();
            let trimmed = s.name.trim();
            let collapsed = match naming::http_status_suffix(trimmed) {
                Some(status) => {
                    labels.push(("status_code".to_string(), status.to_string()));
                    "Http"
                }
                None => trimmed,
            };

            let name = naming::metric_name(prefix, collapsed, &s.unit);
            let help = format!("Azure Monitor metric {} ({})", s.name, s.unit);
            push_aggregations(&mut gauges, &name, &help, &labels, point);
        }

        Ok(gauges)
    }

    /// Certificates expose computed expiry/lifetime gauges from their own
    /// metadata; no Monitor query is issued for this kind.
    async fn certificate_gauges(
        &self,
        client: &AzureClient,
        id: &ResourceId,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExposedGauge>, ReadError> {
        let certificate = resources::get_certificate(client, id.raw())
            .await
            .map_err(ReadError::Backend)?;

        let expiry = certificate
            .expiration_date
            .ok_or_else(|| ReadError::Backend(anyhow!("certificate {} has no expiration date", id.raw())))?;
        let issued = certificate
            .issue_date
            .ok_or_else(|| ReadError::Backend(anyhow!("certificate {} has no issue date", id.raw())))?;

        let labels = vec![(
            "resource_group".to_string(),
            id.resource_group().to_string(),
        )];

        let expires_in = days_between(now, expiry);
        let keyvault_status = match certificate.key_vault_id {
            None => 0.0,
            Some(_)
                if certificate
                    .key_vault_secret_status
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case("succeeded")) =>
            {
                1.0
            }
            Some(_) => 2.0,
        };

        let gauge = |name: &str, help: &str, value: f64| ExposedGauge {
            name: name.to_string(),
            help: help.to_string(),
            labels: labels.clone(),
            value,
        };

        Ok(vec![
            gauge(
                "certificate_expires_in",
                "Certificate will expire in X days",
                expires_in,
            ),
            gauge(
                "certificate_expired",
                "Certificate is expired",
                if expires_in < 0.0 { 1.0 } else { 0.0 },
            ),
            gauge(
                "certificate_lifetime",
                "Had a lifetime of X days",
                days_between(issued, expiry),
            ),
            gauge("certificate_keyvault_status", "Keyvault status", keyvault_status),
        ])
    }
}

fn build_filter(definition_filter: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "({definition_filter}) and (aggregationType eq 'Total' or aggregationType eq 'Maximum' \
         or aggregationType eq 'Minimum' or aggregationType eq 'Average' or aggregationType eq 'Count') \
         and startTime eq {} and endTime eq {} and timeGrain eq duration'PT1M'",
        start.format("%Y-%m-%dT%H:%M:%S"),
        end.format("%Y-%m-%dT%H:%M:%S"),
    )
}

fn base_labels(id: &ResourceId) -> Vec<(String, String)> {
    let mut labels = vec![(
        "resource_group".to_string(),
        id.resource_group().to_string(),
    )];
    if let Some(sql) = id.sql() {
        labels.push(("server".to_string(), sql.server.clone()));
        labels.push(("database".to_string(), sql.database.clone()));
    }
    labels
}

/// Emit the four aggregation gauges for one series' last data point;
/// absent sub-values default to zero
fn push_aggregations(
    gauges: &mut Vec<ExposedGauge>,
    name: &str,
    help: &str,
    labels: &[(String, String)],
    point: &MetricPoint,
) {
    let aggregations = [
        ("total", point.total),
        ("average", point.average),
        ("minimum", point.minimum),
        ("maximum", point.maximum),
    ];
    for (suffix, value) in aggregations {
        gauges.push(ExposedGauge {
            name: format!("{name}_{suffix}"),
            help: help.to_string(),
            labels: labels.to_vec(),
            value: value.unwrap_or(0.0),
        });
    }
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 86_400.0
}
