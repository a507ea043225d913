//! Where the sampler reads raw states from.

pub mod http_state;
pub mod memory;

use homeflux_client::domain::{RawReading, SourceRef};

pub use http_state::HttpStateApi;
pub use memory::InMemoryStateStore;

/// Current state of named sources. Reads are local and never block on I/O.
pub trait StateStore: Send + Sync {
    fn read(&self, source: &SourceRef) -> RawReading;
}
