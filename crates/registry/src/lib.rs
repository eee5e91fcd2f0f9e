//! # Company registry lookup
//!
//! Fetches the public registry record for a [`Cnpj`] and hands it back as a flat JSON object.
//! Transient HTTP failures are retried with a linearly increasing backoff.
//!
//! **No template concerns**: turning the record into placeholder values belongs to
//! `docfill-core`.

mod client;
mod transport;

pub use client::{RegistryClient, RetryPolicy, DEFAULT_BASE_URL};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};

use docfill_types::Cnpj;

/// The registry record: arbitrary keys mapped to strings, numbers, nulls or nested lists.
pub type LookupRecord = serde_json::Map<String, serde_json::Value>;

/// Errors returned by the registry lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("registry answered with HTTP status {0}")]
    Status(u16),

    #[error("registry reported an error: {0}")]
    Provider(String),

    #[error("registry response is not a JSON object: {0}")]
    MalformedResponse(String),

    #[error("registry lookup failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

/// Capability to look a company up by its identifier.
pub trait CompanyLookup {
    fn lookup(&self, cnpj: &Cnpj) -> Result<LookupRecord, LookupError>;
}
