//! Error types for the data-access facade

use thiserror::Error;

/// Result type for facade and session operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for data-access operations
///
/// A lookup that finds nothing is not an error: single-entity reads return
/// `Ok(None)`.
#[derive(Error, Debug)]
pub enum DbError {
    /// A required descriptor, key, field name or filter set was missing or
    /// empty. Always raised before any store call.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// `save` targeted a primary key that is already stored
    #[error("Duplicate key {key} in collection {collection}")]
    DuplicateKey { collection: String, key: String },

    /// Transport, authentication or connection failure
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// The store accepted the request but failed to execute it
    #[error("Store operation failed: {message}")]
    StoreOperationFailed { message: String },

    /// Entity could not be turned into a document
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored document could not be turned back into an entity
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DbError {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a duplicate key error
    pub fn duplicate_key<C: Into<String>, K: Into<String>>(collection: C, key: K) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            key: key.into(),
        }
    }

    /// Create a store unavailable error
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a store operation error
    pub fn operation<S: Into<String>>(message: S) -> Self {
        Self::StoreOperationFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if the caller can fix this error by changing the request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DbError::InvalidArgument { .. } | DbError::DuplicateKey { .. }
        )
    }

    /// Check if this error originated in the store or its transport
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            DbError::StoreUnavailable { .. } | DbError::StoreOperationFailed { .. }
        )
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}
