use std::sync::Arc;

use anyhow::Result;
use reporter_service::{
    config::AppConfig,
    metrics_server,
    observability,
    pipeline::Reporter,
    sources::{HttpStateApi, InMemoryStateStore},
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        let addr = metrics_server::init(&metrics_cfg.bind_addr).await?;
        tracing::info!(%addr, "metrics endpoint listening");
    }

    let store = Arc::new(InMemoryStateStore::new());

    match &cfg.state_api {
        Some(api_cfg) => {
            let api = HttpStateApi::new(
                &api_cfg.http_bind_addr,
                store.clone(),
                api_cfg.auth_bearer_token.clone(),
            )
            .await?;
            tracing::info!(addr = %api.local_addr(), "state API listening");
        }
        None => {
            tracing::warn!("no [state_api] configured; every source will read as unavailable");
        }
    }

    let reporter = Arc::new(Reporter::from_config(&cfg, store)?);
    let cancel = CancellationToken::new();
    let handle = reporter.spawn(cancel.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    cancel.cancel();
    handle.await?;

    Ok(())
}
