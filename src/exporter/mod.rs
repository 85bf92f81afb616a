//! The metric translation and resolution engine
//!
//! This is the core of the exporter: resolving `(resource_type,
//! resource_name)` pairs to ARM resource ids, caching metric definition
//! filters, and translating Azure Monitor series into exposition gauges.
//!
//! # Module Structure
//!
//! - [`resource_id`] - structural resource id parsing and kind detection
//! - [`naming`] - exposition metric name normalization
//! - [`resolver`] - name-to-id resolution with a TTL cache
//! - [`definitions`] - process-wide metric definition filter cache
//! - [`reader`] - the translator producing gauge sets per scrape

pub mod definitions;
pub mod naming;
pub mod reader;
pub mod resolver;
pub mod resource_id;

/// A single named, labeled instantaneous value ready for exposition
#[derive(Debug, Clone, PartialEq)]
pub struct ExposedGauge {
    pub name: String,
    pub help: String,
    /// Label pairs in emission order: resource_group, then server/database
    /// for SQL databases, then status_code for HTTP status series
    pub labels: Vec<(String, String)>,
    pub value: f64,
}
