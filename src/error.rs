//! Error types for the exploration history core.

use thiserror::Error;

/// Error type for unit conversion, history storage and replay.
#[derive(Error, Debug)]
pub enum Error {
    /// Unit identifier not in the supported set.
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// A single stored or imported record failed to decode.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Lookup miss (replay or delete of an id that is not stored).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bulk import payload is not the expected container shape.
    #[error("Import format error: {0}")]
    ImportFormat(String),

    /// The key-value store could not be read or written.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Generation request failed validation.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Settings key or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server history responded with something unusable.
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
