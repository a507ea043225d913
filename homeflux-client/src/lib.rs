//! Wire types and the ingestion API client shared by the reporter binaries.

pub mod api;
pub mod domain;
