/// Domain-level failures. Only input validation lives here; storage, wiki
/// and session failures have their own error types in the crates that
/// produce them.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
}
