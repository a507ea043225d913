mod common;

use std::{sync::Arc, time::Duration};

use common::ScriptedTransport;
use homeflux_client::api::{IngestTarget, Transport};
use reporter_service::{
    config::SourcesConfig, metrics_server, pipeline::Reporter, sinks::IngestSink,
    sources::InMemoryStateStore, transform::Sampler,
};

#[tokio::test]
async fn tick_counters_show_up_on_the_metrics_endpoint() {
    let addr = metrics_server::init("127.0.0.1:0").await.unwrap();

    let store = Arc::new(InMemoryStateStore::new());
    store.set("sensor.grid", "100");
    let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::new(Vec::new()));
    let reporter = Reporter::new(
        store,
        Sampler::new(SourcesConfig {
            grid_power: Some("sensor.grid".into()),
            ..SourcesConfig::default()
        }),
        IngestSink::new(transport, IngestTarget::new("http://ingest.test", "tok")),
        Duration::from_secs(60),
    );
    assert!(reporter.tick().await.is_success());

    let body = reqwest::get(format!("http://{addr}/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("homeflux_ticks_total"), "{body}");
    assert!(body.contains("homeflux_deliveries_total"), "{body}");
    assert!(body.contains("outcome=\"delivered\""), "{body}");
}
