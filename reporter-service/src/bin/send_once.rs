use anyhow::{bail, Result};
use reporter_service::{config::AppConfig, observability, pipeline::Reporter, sources::InMemoryStateStore};
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: send_once <states.json>");
    }

    // Load configuration (HOMEFLUX_CONFIG may point at a test config).
    let cfg = AppConfig::load()?;
    let store = Arc::new(InMemoryStateStore::from_json_file(&args[1])?);

    let reporter = Reporter::from_config(&cfg, store)?;
    let outcome = reporter.tick().await;
    println!("{outcome:?}");

    if !outcome.is_success() {
        bail!("delivery failed: {}", outcome.label());
    }
    Ok(())
}
