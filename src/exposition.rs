//! Prometheus exposition
//!
//! Serializes a gauge set into the text exposition format through a
//! scrape-scoped `prometheus::Registry`. HTTP status series share a family
//! name and differ only in their status_code label, so gauge families are
//! reused within one encoding pass.

use crate::exporter::ExposedGauge;
use anyhow::Result;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;

/// Encode the gauge set into Prometheus text format
pub fn encode(gauges: &[ExposedGauge]) -> Result<String> {
    let registry = Registry::new();
    let mut families: HashMap<String, GaugeVec> = HashMap::new();

    for gauge in gauges {
        let label_names: Vec<&str> = gauge.labels.iter().map(|(name, _)| name.as_str()).collect();

        let family = match families.get(&gauge.name) {
            Some(family) => family.clone(),
            None => {
                let family = GaugeVec::new(Opts::new(&gauge.name, &gauge.help), &label_names)?;
                registry.register(Box::new(family.clone()))?;
                families.insert(gauge.name.clone(), family.clone());
                family
            }
        };

        let label_values: Vec<&str> = gauge.labels.iter().map(|(_, value)| value.as_str()).collect();
        family.with_label_values(&label_values).set(gauge.value);
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge(name: &str, labels: &[(&str, &str)], value: f64) -> ExposedGauge {
        ExposedGauge {
            name: name.to_string(),
            help: format!("{name} help"),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value,
        }
    }

    #[test]
    fn encodes_labeled_gauges() {
        let output = encode(&[gauge(
            "webapp_requests_count_total",
            &[("resource_group", "prod")],
            42.0,
        )])
        .expect("should encode");

        assert!(output.contains("# TYPE webapp_requests_count_total gauge"));
        assert!(output.contains("resource_group=\"prod\""));
        assert!(output.contains("42"));
    }

    #[test]
    fn http_status_series_share_one_family() {
        let output = encode(&[
            gauge(
                "webapp_http_count_total",
                &[("resource_group", "prod"), ("status_code", "2xx")],
                12.0,
            ),
            gauge(
                "webapp_http_count_total",
                &[("resource_group", "prod"), ("status_code", "5xx")],
                1.0,
            ),
        ])
        .expect("should encode");

        assert!(output.contains("status_code=\"2xx\""));
        assert!(output.contains("status_code=\"5xx\""));
        // One TYPE line for the shared family
        assert_eq!(output.matches("# TYPE webapp_http_count_total").count(), 1);
    }

    #[test]
    fn empty_gauge_set_encodes_to_nothing() {
        let output = encode(&[]).expect("should encode");
        assert!(output.is_empty());
    }
}
