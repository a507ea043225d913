use std::{error::Error as StdError, time::Duration};

use reqwest::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};

pub const CLIENT_USER_AGENT: &str = concat!("homeflux-reporter/", env!("CARGO_PKG_VERSION"));

/// A fully built JSON POST, ready to hand to a [`Transport`].
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub url: String,
    pub token: String,
    pub body: Vec<u8>,
    pub timeout: Duration,
}

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("could not build request: {0}")]
    Build(String),
}

/// Sends authenticated JSON POSTs.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, request: IngestRequest) -> Result<HttpReply, TransportError>;
}

/// [`Transport`] over a pooled `reqwest` client, shared across ticks.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .pool_idle_timeout(Some(Duration::from_secs(300)))
            .build()
            .map_err(|e| TransportError::Build(error_chain(&e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: IngestRequest) -> Result<HttpReply, TransportError> {
        let timeout = request.timeout;
        let response = self
            .client
            .post(&request.url)
            .bearer_auth(&request.token)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT))
            .timeout(timeout)
            .body(request.body)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| classify(e, timeout))?;
        Ok(HttpReply { status, body })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_connect() {
        TransportError::Connect(error_chain(&err))
    } else if err.is_builder() {
        TransportError::Build(error_chain(&err))
    } else {
        TransportError::Request(error_chain(&err))
    }
}

/// `reqwest` keeps the interesting part (refused, DNS, TLS) in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
