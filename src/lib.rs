//! On-demand Prometheus exporter for Azure Monitor metrics.
//!
//! Each scrape request names one Azure resource, either by its raw ARM
//! resource id or by a `(resource_type, resource_name)` pair. The exporter
//! resolves the pair to a resource id (with a TTL cache), queries Azure
//! Monitor for the last complete minute of data, and re-exposes the result
//! in Prometheus text format.
//!
//! # Module Structure
//!
//! - [`azure`] - Azure REST clients: authentication, ARM listing, Monitor
//! - [`config`] - JSON configuration file
//! - [`exporter`] - the translation and resolution engine
//! - [`exposition`] - gauge set to Prometheus text encoding
//! - [`server`] - the `/metrics` HTTP surface

pub mod azure;
pub mod config;
pub mod exporter;
pub mod exposition;
pub mod server;
