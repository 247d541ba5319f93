use anyhow::Result;
use dashboard_service::{
    config::AppConfig,
    metrics_server, observability,
    server::{self, AppState},
    DataStore, TableCache,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    // Both tables are loaded before the first request; a bad file stops startup.
    let store = DataStore::load(TableCache::global(), &cfg.data).await?;
    tracing::info!(
        consumption_rows = store.consumption.len(),
        capacity_rows = store.capacity.len(),
        "data loaded"
    );

    let state = AppState {
        store,
        analysis: cfg.analysis.clone(),
    };
    server::serve(&cfg.server.bind_addr, state).await
}
