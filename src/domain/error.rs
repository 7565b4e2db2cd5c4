//! Error handling types
//!
//! The engine's error taxonomy. Every fallible operation in the crate
//! resolves to one of these variants at its public boundary; adapter-local
//! error types (SQLite, config) are converted at the adapter edge via
//! `From` impls so callers never match on a foreign error type.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the code search engine
#[derive(Error, Debug)]
pub enum Error {
    /// Missing/invalid dimension, unknown provider, incompatible collection
    /// dimension, or missing credentials. Fatal; abort the operation.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Search was attempted against a codebase that has no collection yet.
    /// User-facing; never logged as an error.
    #[error("codebase is not indexed")]
    NotIndexed,

    /// Permanent embedding provider failure: auth, model-not-found, or an
    /// oversize input that remained oversize after truncation. The current
    /// indexing run is aborted and its snapshot is not updated.
    #[error("embedding provider error ({provider}): {message}")]
    Embedding {
        /// Name of the provider that failed
        provider: String,
        /// Description of the failure
        message: String,
    },

    /// Underlying store failure (disk full, corruption, schema mismatch).
    /// Fatal; the store file is left as-is for WAL recovery on next open.
    #[error("vector store error: {message}")]
    Store {
        /// Description of the store failure
        message: String,
    },

    /// A concurrent writer already holds the lock for this codebase.
    #[error("codebase {id} is busy with another write")]
    Busy {
        /// The codebase id that is locked
        id: String,
    },

    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Internal-only: a transient embedding failure still within its retry
/// budget. Never returned across the embedding provider boundary — the
/// retry loop in [`crate::providers::embedding::retry`] either recovers or
/// converts the final attempt into [`Error::Embedding`].
#[derive(Error, Debug)]
#[error("transient embedding failure: {0}")]
pub struct TransientEmbeddingError(pub String);

impl Error {
    /// Build a [`Error::Config`]
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build a [`Error::Embedding`]
    pub fn embedding<S: Into<String>, M: Into<String>>(provider: S, message: M) -> Self {
        Self::Embedding {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Build a [`Error::Store`]
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Build a [`Error::Busy`]
    pub fn busy<S: Into<String>>(id: S) -> Self {
        Self::Busy { id: id.into() }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::store(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::config(err.to_string())
    }
}
