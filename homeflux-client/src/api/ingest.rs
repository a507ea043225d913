use std::{fmt, time::Duration};

use time::OffsetDateTime;

use super::transport::{HttpReply, IngestRequest, Transport, TransportError};
use crate::domain::Sample;

pub const DEFAULT_ENDPOINT: &str = "https://api.homeflux.io";
pub const INGEST_PATH: &str = "/ingest";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where samples go and with which credential.
#[derive(Clone)]
pub struct IngestTarget {
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl IngestTarget {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The fixed production endpoint.
    pub fn production(token: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, token)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn ingest_url(&self) -> String {
        format!("{}{}", self.endpoint, INGEST_PATH)
    }
}

impl fmt::Debug for IngestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestTarget")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Result of one delivery decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing but a timestamp to report; no request was made.
    Skipped,
    Delivered { status: u16, body: String },
    /// The endpoint answered with a non-2xx status.
    Rejected { status: u16, body: String },
    TransportFailed { cause: String },
    /// The request could not be produced at all (encoding, client setup).
    Unsendable { cause: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Skipped | Self::Delivered { .. })
    }

    /// Stable name for logs and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Delivered { .. } => "delivered",
            Self::Rejected { .. } => "rejected",
            Self::TransportFailed { .. } => "transport_error",
            Self::Unsendable { .. } => "unsendable",
        }
    }

    fn from_reply(reply: HttpReply) -> Self {
        if (200..300).contains(&reply.status) {
            Self::Delivered {
                status: reply.status,
                body: reply.body,
            }
        } else {
            Self::Rejected {
                status: reply.status,
                body: reply.body,
            }
        }
    }
}

/// POST `sample` to `<endpoint>/ingest` once and classify what happened.
///
/// Used both by steady-state delivery and by credential validation, so the two can
/// never disagree about how a request looks or what a status means.
pub async fn send(transport: &dyn Transport, target: &IngestTarget, sample: &Sample) -> DeliveryOutcome {
    let body = match sample.to_json() {
        Ok(body) => body,
        Err(e) => {
            return DeliveryOutcome::Unsendable {
                cause: format!("failed to encode sample: {e}"),
            }
        }
    };

    let request = IngestRequest {
        url: target.ingest_url(),
        token: target.token.clone(),
        body,
        timeout: target.timeout,
    };

    match transport.post_json(request).await {
        Ok(reply) => DeliveryOutcome::from_reply(reply),
        Err(TransportError::Build(cause)) => DeliveryOutcome::Unsendable { cause },
        Err(e) => DeliveryOutcome::TransportFailed { cause: e.to_string() },
    }
}

/// Send `sample` only if it carries at least one measurement.
pub async fn deliver(transport: &dyn Transport, target: &IngestTarget, sample: &Sample) -> DeliveryOutcome {
    if !sample.has_measurements() {
        return DeliveryOutcome::Skipped;
    }
    send(transport, target, sample).await
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the ingestion endpoint rejected the token")]
    InvalidAuth,
    #[error("cannot reach the ingestion endpoint: {0}")]
    CannotConnect(String),
    #[error("unexpected failure while validating: {0}")]
    Unknown(String),
}

/// Probe `target` with an all-zero sample to check the token before it is stored.
pub async fn validate_credentials(transport: &dyn Transport, target: &IngestTarget) -> Result<(), ValidationError> {
    let probe = Sample::zeroed(OffsetDateTime::now_utc());
    match send(transport, target, &probe).await {
        DeliveryOutcome::Delivered { .. } => Ok(()),
        DeliveryOutcome::Rejected { status: 401, .. } => Err(ValidationError::InvalidAuth),
        DeliveryOutcome::Rejected { status, body } => {
            Err(ValidationError::CannotConnect(format!("HTTP {status}: {body}")))
        }
        DeliveryOutcome::TransportFailed { cause } => Err(ValidationError::CannotConnect(cause)),
        DeliveryOutcome::Unsendable { cause } => Err(ValidationError::Unknown(cause)),
        DeliveryOutcome::Skipped => Err(ValidationError::Unknown("probe was not sent".to_string())),
    }
}
