//! Moderation engine.
//!
//! Orchestrates the two moderator actions on a queued edit:
//!
//! - [`approve`] -- `Pending -> Approved`: fetch a write token with the
//!   moderator's grant, submit the edit upstream, flip the flag.
//! - [`diff`] -- render the upstream diff between the edit's base revision
//!   and its proposed text. Read-only.

pub mod approve;
pub mod diff;

use suggestor_core::types::EditId;
use suggestor_db::repositories::EditQueue;
use suggestor_db::StoreError;
use suggestor_wiki::{WikiApi, WikiError};

#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("Edit {0} not found")]
    NotFound(EditId),

    #[error("Edit {0} has already been approved")]
    AlreadyApproved(EditId),

    /// The wiki no longer honours the moderator's grant.
    #[error("OAuth token no longer valid, please log in again")]
    LoggedOut,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Wiki(WikiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The edit was applied upstream but the approval flag could not be set.
    #[error("Edit {id} was saved on the wiki but could not be marked approved: {source}")]
    Unreconciled { id: EditId, source: StoreError },
}

impl From<WikiError> for ModerationError {
    fn from(err: WikiError) -> Self {
        match err {
            WikiError::LoggedOut => ModerationError::LoggedOut,
            other => ModerationError::Wiki(other),
        }
    }
}

/// Holds the queue and the wiki client; cheap to clone.
#[derive(Clone)]
pub struct ModerationEngine {
    queue: EditQueue,
    wiki: WikiApi,
}

impl ModerationEngine {
    pub fn new(queue: EditQueue, wiki: WikiApi) -> Self {
        Self { queue, wiki }
    }
}
