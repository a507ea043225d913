use std::{sync::Arc, time::Instant};

use homeflux_client::{
    api::{self, DeliveryOutcome, IngestTarget, Transport},
    domain::Sample,
};

/// Delivers one sample per call to the ingestion endpoint, logging and counting the outcome.
///
/// Failures stop here: they are logged and returned, never retried or queued.
pub struct IngestSink {
    transport: Arc<dyn Transport>,
    target: IngestTarget,
}

impl IngestSink {
    pub fn new(transport: Arc<dyn Transport>, target: IngestTarget) -> Self {
        Self { transport, target }
    }

    pub fn target(&self) -> &IngestTarget {
        &self.target
    }

    pub async fn deliver(&self, sample: &Sample) -> DeliveryOutcome {
        let started = Instant::now();
        let outcome = api::deliver(self.transport.as_ref(), &self.target, sample).await;

        metrics::counter!("homeflux_deliveries_total", "outcome" => outcome.label()).increment(1);
        if outcome != DeliveryOutcome::Skipped {
            metrics::histogram!("homeflux_delivery_latency_seconds").record(started.elapsed().as_secs_f64());
        }

        match &outcome {
            DeliveryOutcome::Skipped => {
                tracing::debug!("no readable measurements, nothing to send");
            }
            DeliveryOutcome::Delivered { status, body } => {
                tracing::debug!(status, body = %body, fields = sample.measurement_count(), "sample delivered");
            }
            DeliveryOutcome::Rejected { status, body } => {
                tracing::warn!(status, body = %body, url = %self.target.ingest_url(), "sample rejected");
            }
            DeliveryOutcome::TransportFailed { cause } => {
                tracing::error!(error = %cause, url = %self.target.ingest_url(), "sample delivery failed");
            }
            DeliveryOutcome::Unsendable { cause } => {
                tracing::error!(error = %cause, "sample could not be sent");
            }
        }

        outcome
    }
}
