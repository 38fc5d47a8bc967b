use std::sync::Arc;

use anyhow::Result;
use energy_service::{api, config::AppConfig, metrics_server, observability, registry::StationRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let registry = StationRegistry::from_config(&cfg)?;
    if registry.is_empty() {
        tracing::warn!("no stations configured");
    }
    tracing::info!(stations = registry.len(), "station registry loaded");

    api::serve(&cfg.api.bind_addr, Arc::new(registry)).await
}
