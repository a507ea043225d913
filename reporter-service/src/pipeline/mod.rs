use std::{sync::Arc, time::Duration};

use futures::StreamExt;
use homeflux_client::api::{DeliveryOutcome, ReqwestTransport};
use time::OffsetDateTime;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;

use crate::{config::AppConfig, sinks::IngestSink, sources::StateStore, transform::Sampler};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("sink error: {0}")]
    Sink(String),
}

/// Sample-and-deliver loop: one tick right away, then one per `interval`.
///
/// Ticks never overlap. A slow delivery delays the next tick, and ticks missed
/// meanwhile are dropped rather than fired in a burst.
pub struct Reporter {
    store: Arc<dyn StateStore>,
    sampler: Sampler,
    sink: IngestSink,
    interval: Duration,
}

impl Reporter {
    pub fn new(store: Arc<dyn StateStore>, sampler: Sampler, sink: IngestSink, interval: Duration) -> Self {
        Self {
            store,
            sampler,
            sink,
            interval,
        }
    }

    pub fn from_config(cfg: &AppConfig, store: Arc<dyn StateStore>) -> Result<Self, PipelineError> {
        let transport = ReqwestTransport::new().map_err(|e| PipelineError::Sink(e.to_string()))?;
        Ok(Self::new(
            store,
            Sampler::new(cfg.sources.clone()),
            IngestSink::new(Arc::new(transport), cfg.ingest_target()),
            cfg.interval(),
        ))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One sample, at most one delivery attempt.
    pub async fn tick(&self) -> DeliveryOutcome {
        metrics::counter!("homeflux_ticks_total").increment(1);
        let sample = self.sampler.sample(self.store.as_ref(), OffsetDateTime::now_utc());
        self.sink.deliver(&sample).await
    }

    /// Tick until `cancel` fires. An in-flight delivery is bounded by the request timeout.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks = std::pin::pin!(IntervalStream::new(ticker).take_until(cancel.cancelled()));

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            endpoint = %self.sink.target().endpoint(),
            "reporter started"
        );

        while ticks.next().await.is_some() {
            let outcome = self.tick().await;
            tracing::trace!(outcome = outcome.label(), "tick finished");
        }

        tracing::info!("reporter stopped");
    }

    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}
