//! HTTP surface
//!
//! One route: `GET /metrics?resource_id=...` or
//! `GET /metrics?resource_type=...&resource_name=...`, with an optional
//! `subscription_id` selecting a configured credential set. Resolution
//! failures map to 404, backend failures to 500, so operators can tell
//! "no such resource" from "backend unavailable".

use crate::azure::client::AzureClient;
use crate::config::{Config, DEFAULT_SUBSCRIPTION_KEY};
use crate::exporter::reader::MetricReader;
use crate::exporter::resolver::{ResolveError, ResourceResolver};
use crate::exporter::resource_id::ResourceId;
use crate::exposition;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared application state
pub struct AppState {
    clients: HashMap<String, AzureClient>,
    resolver: ResourceResolver,
    reader: MetricReader,
}

impl AppState {
    /// Build one client per configured subscription plus the shared caches
    pub fn new(config: &Config) -> Result<Self> {
        let mut clients = HashMap::new();
        for (key, subscription) in &config.subscriptions {
            let client = AzureClient::new(subscription, &config.management_url, &config.login_url)?;
            clients.insert(key.clone(), client);
        }

        Ok(Self {
            clients,
            resolver: ResourceResolver::new(config.cache_expiration()),
            reader: MetricReader::new(),
        })
    }

    /// Unknown or missing subscription ids fall back to the default entry
    fn client_for(&self, subscription_id: Option<&str>) -> Option<&AzureClient> {
        subscription_id
            .and_then(|key| self.clients.get(key))
            .or_else(|| self.clients.get(DEFAULT_SUBSCRIPTION_KEY))
    }
}

/// Query parameters of one scrape request
#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    resource_id: Option<String>,
    resource_type: Option<String>,
    resource_name: Option<String>,
    subscription_id: Option<String>,
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScrapeParams>,
) -> Response {
    match handle_scrape(&state, params).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err((status, message)) => (status, message).into_response(),
    }
}

async fn handle_scrape(
    state: &AppState,
    params: ScrapeParams,
) -> Result<String, (StatusCode, String)> {
    let started = Instant::now();

    let raw_id = params.resource_id.filter(|s| !s.is_empty());
    let lookup = match (
        params.resource_type.filter(|s| !s.is_empty()),
        params.resource_name.filter(|s| !s.is_empty()),
    ) {
        (Some(resource_type), Some(resource_name)) => Some((resource_type, resource_name)),
        _ => None,
    };

    if raw_id.is_none() && lookup.is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            "resource_id or resource_type and resource_name is required".to_string(),
        ));
    }

    let client = state
        .client_for(params.subscription_id.as_deref())
        .ok_or_else(|| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "no default subscription configured".to_string(),
            )
        })?;

    let id = match raw_id {
        Some(raw) => ResourceId::parse(&raw)
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => {
            // lookup is present when raw_id is not, checked above
            let (resource_type, resource_name) = lookup.ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    "resource_id or resource_type and resource_name is required".to_string(),
                )
            })?;
            state
                .resolver
                .resolve(client, &resource_type, &resource_name)
                .await
                .map_err(|e| resolve_response(&resource_type, &resource_name, e))?
        }
    };

    let gauges = state
        .reader
        .read_metrics(client, &id)
        .await
        .map_err(|e| {
            tracing::warn!(resource = id.raw(), error = %e, "reading metrics failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("reading metrics failed for resource {}", id.raw()),
            )
        })?;

    let body = exposition::encode(&gauges).map_err(|e| {
        tracing::error!(error = %e, "encoding metrics failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "encoding metrics failed".to_string(),
        )
    })?;

    tracing::info!(
        resource = id.raw(),
        gauges = gauges.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scrape complete"
    );

    Ok(body)
}

fn resolve_response(
    resource_type: &str,
    resource_name: &str,
    error: ResolveError,
) -> (StatusCode, String) {
    match error {
        ResolveError::Backend(e) => {
            tracing::error!(resource_type, resource_name, error = %e, "resource lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "resource lookup failed".to_string(),
            )
        }
        e => {
            tracing::warn!(resource_type, resource_name, error = %e, "resource not found");
            (StatusCode::NOT_FOUND, "resource_id not found!".to_string())
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(state)
}

/// Start the metrics server
pub async fn serve(port: u16, state: Arc<AppState>) -> Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!(addr = %addr, "starting metrics server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
