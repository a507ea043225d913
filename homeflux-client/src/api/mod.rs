pub mod ingest;
pub mod transport;

pub use ingest::{
    deliver, send, validate_credentials, DeliveryOutcome, IngestTarget, ValidationError, DEFAULT_ENDPOINT,
    DEFAULT_TIMEOUT,
};
pub use transport::{HttpReply, IngestRequest, ReqwestTransport, Transport, TransportError};
