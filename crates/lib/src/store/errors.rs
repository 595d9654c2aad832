//! Store error types.
//!
//! This module defines structured error types for record store operations,
//! providing better error context and type safety compared to string-based errors.

use thiserror::Error;

use crate::record::RecordId;

/// Errors that can occur during record store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found by ID.
    #[error("Record not found: {id}")]
    RecordNotFound {
        /// The ID of the record that was not found
        id: RecordId,
    },

    /// A record with this ID already exists.
    #[error("Record already exists: {id}")]
    DuplicateRecord {
        /// The conflicting ID
        id: RecordId,
    },

    /// SQL operation failed.
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of the failed operation, including the driver message
        reason: String,
        /// The underlying sqlx error, when one exists
        #[cfg(any(feature = "sqlite", feature = "postgres"))]
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected before use.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the configuration
        reason: String,
    },

    /// Persisted data does not have the expected shape.
    #[error("Malformed stored row: {reason}")]
    MalformedRow {
        /// Description of the malformed data
        reason: String,
    },
}

impl StoreError {
    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::RecordNotFound { .. })
    }

    /// Check if this error indicates a key conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::DuplicateRecord { .. })
    }

    /// Check if this error is related to I/O or (de)serialization.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
                | StoreError::MalformedRow { .. }
        )
    }

    /// Check if this error came from the SQL driver.
    pub fn is_sql_error(&self) -> bool {
        matches!(self, StoreError::SqlxError { .. })
    }

    /// Get the record ID if this error is about a specific record.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            StoreError::RecordNotFound { id } | StoreError::DuplicateRecord { id } => Some(*id),
            _ => None,
        }
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
