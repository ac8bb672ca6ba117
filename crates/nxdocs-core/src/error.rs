//! Error types for `nxdocs-core`.

/// Errors from the device-local saved-command store.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Reading or writing the backing file failed.
    #[error("local store i/o failed for '{path}': {reason}")]
    Io { path: String, reason: String },

    /// The stored list is not valid JSON for saved commands.
    #[error("local store '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    /// The list could not be encoded.
    #[error("failed to encode local store '{key}': {reason}")]
    Encode { key: String, reason: String },
}
