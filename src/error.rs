//! Error types for dalkit
//!
//! Provides a unified error type for cache, lock and query operations.

use thiserror::Error;

/// Result type alias using DalError
pub type Result<T> = std::result::Result<T, DalError>;

/// Unified error type for dalkit operations
#[derive(Debug, Error)]
pub enum DalError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    /// A key, hash field or list had nothing to read
    #[error("Missing key: {0}")]
    MissingKey(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// A value could not be encoded, or stored text could not be parsed
    /// into the requested shape
    #[error("Format error: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DalError {
    /// True when the underlying key-value or relational call itself failed
    pub fn is_store_error(&self) -> bool {
        match self {
            DalError::Store(_) | DalError::Database(_) => true,
            #[cfg(feature = "redis")]
            DalError::Redis(_) => true,
            _ => false,
        }
    }

    /// True for reads of an absent key, field or empty list
    pub fn is_missing_key(&self) -> bool {
        matches!(self, DalError::MissingKey(_))
    }
}

impl From<serde_json::Error> for DalError {
    fn from(err: serde_json::Error) -> Self {
        DalError::Format(err.to_string())
    }
}

impl From<serde_yaml::Error> for DalError {
    fn from(err: serde_yaml::Error) -> Self {
        DalError::Config(err.to_string())
    }
}
