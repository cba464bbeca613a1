use suggestor_core::types::EditId;

/// Errors from the key-value layer and the repositories built on it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The Redis client or server failed.
    #[error("Key-value store error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The backend refused the operation (in-memory backend switched off).
    #[error("Key-value store unavailable")]
    Unavailable,

    /// No record exists for the id.
    #[error("Edit {0} not found")]
    NotFound(EditId),

    /// The queue index lists an id whose record is gone. Needs out-of-band
    /// cleanup; never repaired automatically.
    #[error("Edit {id} is listed in the queue index but its record is missing")]
    Consistency { id: String },

    /// A stored field could not be parsed back into its type.
    #[error("Edit {id} has malformed field '{field}': {value:?}")]
    Malformed {
        id: String,
        field: &'static str,
        value: String,
    },
}
