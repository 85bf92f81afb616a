//! Azure Monitor API
//!
//! Metric definition listing and the `$filter` based metrics query.

use super::client::AzureClient;
use anyhow::Result;
use serde_json::Value;

/// The classic filter-based metrics API
const MONITOR_API_VERSION: &str = "2016-09-01";

/// One data point of a metric series; each aggregation is optional
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricPoint {
    pub total: Option<f64>,
    pub average: Option<f64>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl From<&Value> for MetricPoint {
    fn from(value: &Value) -> Self {
        Self {
            total: value.get("total").and_then(Value::as_f64),
            average: value.get("average").and_then(Value::as_f64),
            minimum: value.get("minimum").and_then(Value::as_f64),
            maximum: value.get("maximum").and_then(Value::as_f64),
        }
    }
}

/// One named series returned for the query window
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub name: String,
    pub unit: String,
    pub data: Vec<MetricPoint>,
}

impl From<&Value> for MetricSeries {
    fn from(value: &Value) -> Self {
        Self {
            name: value
                .get("name")
                .and_then(|n| n.get("value"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            unit: value
                .get("unit")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            data: value
                .get("data")
                .and_then(|v| v.as_array())
                .map(|points| points.iter().map(MetricPoint::from).collect())
                .unwrap_or_default(),
        }
    }
}

/// List the metric definition names available for a resource
pub async fn list_metric_definitions(
    client: &AzureClient,
    resource_id: &str,
) -> Result<Vec<String>> {
    let url = client.resource_url(resource_id, "/providers/microsoft.insights/metricDefinitions");
    let response = client
        .get(&url, &[("api-version", MONITOR_API_VERSION)])
        .await?;

    Ok(response
        .get("value")
        .and_then(|v| v.as_array())
        .map(|definitions| {
            definitions
                .iter()
                .filter_map(|d| {
                    d.get("name")
                        .and_then(|n| n.get("value"))
                        .and_then(|v| v.as_str())
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default())
}

/// Query metric data for a resource with a prebuilt `$filter` expression
pub async fn query_metrics(
    client: &AzureClient,
    resource_id: &str,
    filter: &str,
) -> Result<Vec<MetricSeries>> {
    let url = client.resource_url(resource_id, "/providers/microsoft.insights/metrics");
    let response = client
        .get(
            &url,
            &[("api-version", MONITOR_API_VERSION), ("$filter", filter)],
        )
        .await?;

    Ok(response
        .get("value")
        .and_then(|v| v.as_array())
        .map(|series| series.iter().map(MetricSeries::from).collect())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn series_parses_nested_name_and_points() {
        let value = json!({
            "name": { "value": "Http2xx", "localizedValue": "Http 2xx" },
            "unit": "Count",
            "data": [
                { "timeStamp": "2026-08-26T11:58:00Z", "total": 12.0, "average": 3.0 },
                { "timeStamp": "2026-08-26T11:59:00Z", "maximum": 5.0 }
            ]
        });
        let series = MetricSeries::from(&value);
        assert_eq!(series.name, "Http2xx");
        assert_eq!(series.unit, "Count");
        assert_eq!(series.data.len(), 2);
        assert_eq!(series.data[0].total, Some(12.0));
        assert_eq!(series.data[1].total, None);
        assert_eq!(series.data[1].maximum, Some(5.0));
    }

    #[test]
    fn series_without_data_is_empty() {
        let value = json!({ "name": { "value": "Requests" }, "unit": "Count" });
        let series = MetricSeries::from(&value);
        assert!(series.data.is_empty());
    }
}
