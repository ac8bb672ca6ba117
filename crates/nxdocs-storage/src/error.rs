//! Storage error types.
//!
//! Lookup misses are not errors. Every variant here means the backend itself
//! failed, and carries enough context to diagnose it from the logs.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open or migrate the storage backend.
    #[error("failed to open storage: {reason}")]
    Open { reason: String },

    /// A query against the backend failed.
    #[error("{operation} failed: {reason}")]
    Query {
        operation: &'static str,
        reason: String,
    },

    /// A stored row could not be turned back into a record.
    #[error("invalid {field} in stored row: {reason}")]
    Decode { field: &'static str, reason: String },

    /// An embedded fixture file could not be parsed.
    #[error("invalid fixture '{name}': {reason}")]
    Fixture { name: String, reason: String },
}
