//! Error taxonomy for the sync client.
//!
//! Kinds, not type names: each enum groups the failures a particular
//! component can produce so call sites can match on them instead of
//! collapsing everything to `anyhow::Error` right away. `anyhow` is still
//! used at the process boundary in `main`.

use thiserror::Error;

/// Configuration problems: surfaced to the user via a separate reporter
/// channel, and treated as "offline" by the sync engine.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API URL configured")]
    MissingApiUrl,
    #[error("no API token configured")]
    MissingApiToken,
    #[error("config file at {path} could not be parsed: {source}")]
    Invalid {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Transport-level failures: the request never produced a response we can
/// interpret (status 0, DNS failure, timeout, connection reset).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to the API: {0}")]
    FailedToConnectWithApi(String),
}

/// Remote semantic failures: the server responded, but with an error.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("failed to create symptom: {0}")]
    FailedToCreateSymptom(String),
    #[error("failed to update symptom: {0}")]
    FailedToUpdateSymptom(String),
    #[error("failed to delete symptom: {0}")]
    FailedToDeleteSymptom(String),
    #[error("symptom does not exist")]
    SymptomDoesNotExist,
    #[error("failed to create metric: {0}")]
    FailedToCreateMetric(String),
    #[error("failed to update metric: {0}")]
    FailedToUpdateMetric(String),
    #[error("failed to delete metric: {0}")]
    FailedToDeleteMetric(String),
    #[error("metric does not exist")]
    MetricDoesNotExist,
    #[error("server returned malformed payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RemoteError {
    /// True for the "entity already gone" cases a Delete should treat as
    /// success.
    pub fn is_missing_entity(&self) -> bool {
        matches!(self, RemoteError::SymptomDoesNotExist | RemoteError::MetricDoesNotExist)
    }
}

/// Domain-level failures: programmer errors or stale references, returned
/// from store mutations rather than thrown.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("store was already initialized")]
    InitializationFailed,
    #[error("failed to update: {reason}")]
    FailedToUpdate { reason: String },
}

/// Failures from the key-value persistence primitive.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to open local store at {path}: {source}")]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: r2d2::Error,
    },
    #[error("local store query failed: {0}")]
    Query(#[from] rusqlite::Error),
    #[error("slot {slot} held malformed JSON: {source}")]
    MalformedSlot {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
